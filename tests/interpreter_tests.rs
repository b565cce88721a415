//! Interpreter integration tests.
//!
//! These tests drive the interpreter with JSON effect programs the way a
//! host would receive them:
//! - Spread targeting and damage accounting
//! - Run-wide caps (damage, spawns, entities, chains)
//! - Critical versus recoverable failures
//! - Deferred bodies through the host-owned queue

use effect_forge::core::{Entity, EntityId, InterpreterLimits, World};
use effect_forge::effects::{
    DeferredQueue, EffectExpression, EffectInterpreter, ExecutionContext, InterpreterError,
};
use serde_json::json;

struct Arena {
    world: World,
    caster: EntityId,
    enemies: Vec<EntityId>,
    bystander: EntityId,
}

/// Caster at the origin, three enemies close by, one bystander far away.
fn arena() -> Arena {
    let mut world = World::new();
    let caster = world.spawn(Entity::new().at(0.0, 0.0).with_health(1.0).with_faction("order"));
    let enemies = vec![
        world.spawn(Entity::new().at(1.0, 0.0).with_health(1.0).with_faction("chaos")),
        world.spawn(Entity::new().at(0.0, 2.0).with_health(1.0).with_faction("chaos")),
        world.spawn(Entity::new().at(-2.0, -2.0).with_health(1.0).with_faction("chaos")),
    ];
    let bystander = world.spawn(Entity::new().at(500.0, 500.0).with_health(1.0));
    Arena {
        world,
        caster,
        enemies,
        bystander,
    }
}

fn effect(value: serde_json::Value) -> EffectExpression {
    EffectExpression::from_value(&value).expect("fixture should decode")
}

fn health(world: &World, id: EntityId) -> f64 {
    world.get(id).and_then(|e| e.health).expect("entity should have health")
}

/// Area damage hits everything in range except the caster.
#[test]
fn test_fireball_hits_enemies_in_radius() {
    let mut a = arena();
    let fireball = effect(json!({
        "id": "fireball",
        "target": {"type": "area", "radius": 5, "excludeSelf": true},
        "operations": [
            {"op": "deal_damage", "amount": 30, "damageType": "fire"},
            {"op": "apply_status", "status": "burning", "duration": 3}
        ],
        "timing": {"type": "immediate"}
    }));

    let mut interpreter = EffectInterpreter::new(InterpreterLimits::default());
    let ctx = ExecutionContext::new(a.caster, a.enemies[0], 0);
    let result = interpreter.execute(&fireball, ctx, &mut a.world).unwrap();

    assert!(result.success);
    assert!(result.error.is_none());
    assert_eq!(result.affected_entities, a.enemies);
    assert!((result.damage_dealt - 90.0).abs() < 1e-9);
    assert_eq!(result.operations_executed, 6);

    for enemy in &a.enemies {
        assert!((health(&a.world, *enemy) - 0.7).abs() < 1e-9);
        assert!(a.world.get(*enemy).unwrap().has_status("burning"));
    }
    assert_eq!(health(&a.world, a.caster), 1.0);
    assert_eq!(health(&a.world, a.bystander), 1.0);
}

/// Expressions scale amounts from caster stats.
#[test]
fn test_damage_scales_with_caster_stat() {
    let mut a = arena();
    a.world.get_mut(a.caster).unwrap().stats.insert("intelligence".to_string(), 4.0);
    let bolt = effect(json!({
        "target": {"type": "single"},
        "operations": [
            {"op": "deal_damage", "amount": {"op": "*", "left": "caster.intelligence", "right": 5}}
        ],
        "timing": {"type": "immediate"}
    }));

    let mut interpreter = EffectInterpreter::default();
    let result = interpreter
        .execute(&bolt, ExecutionContext::new(a.caster, a.enemies[1], 0), &mut a.world)
        .unwrap();

    assert!((result.damage_dealt - 20.0).abs() < 1e-9);
    assert!((health(&a.world, a.enemies[1]) - 0.8).abs() < 1e-9);
}

/// Cumulative damage is clamped to the per-effect cap.
#[test]
fn test_damage_cap_spans_targets() {
    let mut a = arena();
    let nova = effect(json!({
        "target": {"type": "area", "radius": 5, "excludeSelf": true},
        "operations": [{"op": "deal_damage", "amount": 60}],
        "timing": {"type": "immediate"}
    }));

    let limits = InterpreterLimits::default().with_max_damage(100.0);
    let mut interpreter = EffectInterpreter::new(limits);
    let result = interpreter
        .execute(&nova, ExecutionContext::new(a.caster, a.enemies[0], 0), &mut a.world)
        .unwrap();

    assert!((result.damage_dealt - 100.0).abs() < 1e-9);
    assert!((health(&a.world, a.enemies[0]) - 0.4).abs() < 1e-9);
    assert!((health(&a.world, a.enemies[1]) - 0.6).abs() < 1e-9);
    assert_eq!(health(&a.world, a.enemies[2]), 1.0);
}

/// Once the entity cap is reached, operations on new entities are skipped.
#[test]
fn test_entity_cap_skips_new_targets() {
    let mut a = arena();
    let nova = effect(json!({
        "target": {"type": "area", "radius": 5, "excludeSelf": true},
        "operations": [{"op": "deal_damage", "amount": 10}],
        "timing": {"type": "immediate"}
    }));

    let mut interpreter = EffectInterpreter::new(InterpreterLimits::default().with_max_entities(2));
    let result = interpreter
        .execute(&nova, ExecutionContext::new(a.caster, a.enemies[0], 0), &mut a.world)
        .unwrap();

    assert!(result.success);
    assert_eq!(result.affected_entities, vec![a.enemies[0], a.enemies[1]]);
    assert_eq!(health(&a.world, a.enemies[2]), 1.0);
}

/// Spawns are clamped to the cap and placed at the target.
#[test]
fn test_spawn_cap_and_placement() {
    let mut a = arena();
    let swarm = effect(json!({
        "target": {"type": "single"},
        "operations": [{"op": "spawn_entity", "entityType": "wolf", "count": 8}],
        "timing": {"type": "immediate"}
    }));

    let mut interpreter = EffectInterpreter::new(InterpreterLimits::default().with_max_spawns(3));
    let before = a.world.len();
    let result = interpreter
        .execute(&swarm, ExecutionContext::new(a.caster, a.enemies[1], 0), &mut a.world)
        .unwrap();

    assert_eq!(result.spawned, 3);
    assert_eq!(a.world.len(), before + 3);
    for id in &result.spawned_entities {
        let wolf = a.world.get(*id).unwrap();
        assert_eq!(wolf.archetype.as_deref(), Some("wolf"));
        assert_eq!(wolf.position, a.world.get(a.enemies[1]).unwrap().position);
    }
}

/// A chain fanning out to every enemy counts one per new target.
#[test]
fn test_chain_fans_out() {
    let mut a = arena();
    let mut interpreter = EffectInterpreter::default();
    interpreter.register_effect(effect(json!({
        "id": "spark",
        "target": {"type": "single"},
        "operations": [{"op": "deal_damage", "amount": 5}],
        "timing": {"type": "immediate"}
    })));

    let storm = effect(json!({
        "target": {"type": "self"},
        "operations": [{
            "op": "chain_effect",
            "effectId": "spark",
            "newTarget": {"type": "area", "radius": 5, "excludeSelf": true}
        }],
        "timing": {"type": "immediate"}
    }));

    let result = interpreter
        .execute(&storm, ExecutionContext::new(a.caster, a.caster, 0), &mut a.world)
        .unwrap();

    assert_eq!(result.chain_count, 3);
    assert!((result.damage_dealt - 15.0).abs() < 1e-9);
}

/// A self-referencing chain with no exclusion runs into the chain limit.
#[test]
fn test_runaway_chain_is_critical() {
    let mut a = arena();
    let echo = effect(json!({
        "id": "echo",
        "target": {"type": "single"},
        "operations": [
            {"op": "deal_damage", "amount": 1},
            {"op": "chain_effect", "effectId": "echo", "newTarget": {"type": "single"}}
        ],
        "timing": {"type": "immediate"}
    }));

    let mut interpreter = EffectInterpreter::default();
    let err = interpreter
        .execute(&echo, ExecutionContext::new(a.caster, a.enemies[0], 0), &mut a.world)
        .unwrap_err();

    assert_eq!(err, InterpreterError::ChainDepthLimit { limit: 5 });
    assert!(err.is_critical());
}

/// Unknown chain targets are a quiet no-op.
#[test]
fn test_unknown_chain_is_noop() {
    let mut a = arena();
    let fizzle = effect(json!({
        "target": {"type": "single"},
        "operations": [{"op": "chain_effect", "effectId": "nowhere", "newTarget": {"type": "all"}}],
        "timing": {"type": "immediate"}
    }));

    let mut interpreter = EffectInterpreter::default();
    let result = interpreter
        .execute(&fizzle, ExecutionContext::new(a.caster, a.enemies[0], 0), &mut a.world)
        .unwrap();

    assert!(result.success);
    assert_eq!(result.chain_count, 0);
}

/// A repeat that would blow the operation budget aborts the run.
#[test]
fn test_operation_limit_is_critical() {
    let mut a = arena();
    let barrage = effect(json!({
        "target": {"type": "single"},
        "operations": [{
            "op": "repeat",
            "times": 500,
            "operations": [{"op": "deal_damage", "amount": 1}]
        }],
        "timing": {"type": "immediate"}
    }));

    let mut interpreter = EffectInterpreter::new(InterpreterLimits::default().with_max_operations(50));
    let err = interpreter
        .execute(&barrage, ExecutionContext::new(a.caster, a.enemies[0], 0), &mut a.world)
        .unwrap_err();

    assert_eq!(err, InterpreterError::OperationLimit { limit: 50 });
}

/// Stats outside the vocabulary abort the run.
#[test]
fn test_unknown_stat_is_critical() {
    let mut a = arena();
    let hack = effect(json!({
        "target": {"type": "single"},
        "operations": [{"op": "modify_stat", "stat": "gold_coins", "amount": 1000}],
        "timing": {"type": "immediate"}
    }));

    let mut interpreter = EffectInterpreter::default();
    let err = interpreter
        .execute(&hack, ExecutionContext::new(a.caster, a.enemies[0], 0), &mut a.world)
        .unwrap_err();

    assert!(err.is_critical());
}

/// A missing component ends the run early but keeps what already happened.
#[test]
fn test_missing_component_is_recoverable() {
    let mut a = arena();
    a.world.get_mut(a.enemies[0]).unwrap().health = Some(0.5);
    a.world.get_mut(a.caster).unwrap().position = None;
    let shove = effect(json!({
        "target": {"type": "single"},
        "operations": [
            {"op": "heal", "amount": 10},
            {"op": "push", "distance": 3},
            {"op": "heal", "amount": 10}
        ],
        "timing": {"type": "immediate"}
    }));

    let mut interpreter = EffectInterpreter::default();
    let result = interpreter
        .execute(&shove, ExecutionContext::new(a.caster, a.enemies[0], 0), &mut a.world)
        .unwrap();

    assert!(!result.success);
    assert!(result.error.is_some());
    assert!((result.healing_done - 10.0).abs() < 1e-9);
    assert!((health(&a.world, a.enemies[0]) - 0.6).abs() < 1e-9);
}

/// Unmet preconditions skip the whole effect.
#[test]
fn test_preconditions_gate_execution() {
    let mut a = arena();
    let execute = effect(json!({
        "target": {"type": "single"},
        "conditions": [{"predicate": {"op": "<", "left": "target.health", "right": 0.25}}],
        "operations": [{"op": "deal_damage", "amount": 100}],
        "timing": {"type": "immediate"}
    }));

    let mut interpreter = EffectInterpreter::default();
    let result = interpreter
        .execute(&execute, ExecutionContext::new(a.caster, a.enemies[0], 0), &mut a.world)
        .unwrap();

    assert!(!result.success);
    assert_eq!(result.reason.as_deref(), Some("conditions_not_met"));
    assert_eq!(health(&a.world, a.enemies[0]), 1.0);
}

/// Delayed bodies come back through the queue on their due tick.
#[test]
fn test_delayed_body_runs_when_due() {
    let mut a = arena();
    let fuse = effect(json!({
        "target": {"type": "single"},
        "operations": [
            {"op": "emit_event", "eventType": "fuse_lit"},
            {"op": "delay", "ticks": 3, "operations": [{"op": "deal_damage", "amount": 50}]}
        ],
        "timing": {"type": "immediate"}
    }));

    let mut interpreter = EffectInterpreter::default();
    let result = interpreter
        .execute(&fuse, ExecutionContext::new(a.caster, a.enemies[0], 10), &mut a.world)
        .unwrap();

    assert_eq!(result.events.len(), 1);
    assert_eq!(result.damage_dealt, 0.0);
    assert_eq!(result.deferred.len(), 1);

    let mut queue = DeferredQueue::new();
    queue.schedule_all(result.deferred);
    assert_eq!(queue.next_due(), Some(13));
    assert!(queue.drain_due(12).is_empty());

    let due = queue.drain_due(13);
    assert_eq!(due.len(), 1);
    let later = interpreter.execute_deferred(&due[0], 13, &mut a.world).unwrap();

    assert!((later.damage_dealt - 50.0).abs() < 1e-9);
    assert!((health(&a.world, a.enemies[0]) - 0.5).abs() < 1e-9);
    assert!(queue.is_empty());
}

/// A fresh run does not inherit counters from the previous one.
#[test]
fn test_counters_reset_between_runs() {
    let mut a = arena();
    let jab = effect(json!({
        "target": {"type": "single"},
        "operations": [{"op": "deal_damage", "amount": 60}],
        "timing": {"type": "immediate"}
    }));

    let mut interpreter = EffectInterpreter::new(InterpreterLimits::default().with_max_damage(60.0));
    let ctx = ExecutionContext::new(a.caster, a.enemies[0], 0);
    let first = interpreter.execute(&jab, ctx, &mut a.world).unwrap();
    let second = interpreter.execute(&jab, ctx, &mut a.world).unwrap();

    assert!((first.damage_dealt - 60.0).abs() < 1e-9);
    assert!((second.damage_dealt - 60.0).abs() < 1e-9);
    assert_eq!(health(&a.world, a.enemies[0]), 0.0);
}
