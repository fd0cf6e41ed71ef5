//! Save/load of conductors and powered nodes across a running circuit.

use ohm_conductor::{
    Conductor, ConductorId, ConductorState, Connectable, DeviceId, FlowSnapshot, FlowState,
    NodeState, PortId, PoweredNode, StateError, TickId,
};
use ohm_test_utils::fixtures::{chain, unit_config};

/// A device with a single port and a single neighbor.
struct Single<'a> {
    tick: TickId,
    out: &'a mut Conductor,
}

impl Connectable for Single<'_> {
    fn tick(&self) -> TickId {
        self.tick
    }

    fn conductor(&mut self, _port: PortId) -> Option<&mut Conductor> {
        None
    }

    fn conductor_out(&mut self, port: PortId) -> Option<&mut Conductor> {
        (port == PortId(0)).then_some(&mut *self.out)
    }
}

fn flow_node(device: u64, voltage: f64) -> PoweredNode<FlowState> {
    let mut conductor =
        Conductor::new(ConductorId::from(DeviceId(device)), [PortId(0)], unit_config()).unwrap();
    conductor.set_voltage(voltage);
    PoweredNode::new(conductor, FlowState::default())
}

fn tick_pair(a: &mut PoweredNode<FlowState>, b: &mut PoweredNode<FlowState>, tick: TickId) {
    a.update(&mut Single {
        tick,
        out: b.conductor_mut(),
    });
    b.update(&mut Single {
        tick,
        out: a.conductor_mut(),
    });
}

#[test]
fn chain_resumes_identically_after_reload() {
    let (mut source, ids) = chain(4, 10.0);
    source.run(10);

    let saved: Vec<ConductorState> = ids
        .iter()
        .map(|&id| source.conductor(id).unwrap().save())
        .collect();
    let json = serde_json::to_string(&saved).unwrap();
    let saved: Vec<ConductorState> = serde_json::from_str(&json).unwrap();

    let (mut restored, restored_ids) = chain(4, 0.0);
    for (&id, state) in restored_ids.iter().zip(&saved) {
        restored.conductor_mut(id).unwrap().load(state).unwrap();
    }
    restored.set_tick(source.tick());

    source.run(10);
    restored.run(10);
    for (&o, &r) in ids.iter().zip(&restored_ids) {
        assert_eq!(
            source.conductor(o).unwrap().save(),
            restored.conductor(r).unwrap().save()
        );
    }
}

#[test]
fn flow_state_follows_converged_voltage() {
    let mut a = flow_node(1, 20.0);
    let mut b = flow_node(2, 0.0);

    let mut tick = TickId(0);
    tick = tick.next();
    tick_pair(&mut a, &mut b, tick);
    assert_eq!(a.extension().charge(), 200);
    assert!(a.extension().is_active());
    assert_eq!(b.extension().charge(), 0);
    assert!(!b.extension().is_active());

    for _ in 0..200 {
        tick = tick.next();
        tick_pair(&mut a, &mut b, tick);
    }
    for node in [&a, &b] {
        let flow = node.extension();
        assert!((99..=100).contains(&flow.charge()), "charge {}", flow.charge());
        assert_eq!(flow.activity(), u32::MAX);
        assert_eq!(flow.flow_scaled(16), 16);
    }
}

#[test]
fn powered_nodes_resume_identically_after_reload() {
    let mut a = flow_node(1, 20.0);
    let mut b = flow_node(2, 0.0);
    for t in 1..=6 {
        tick_pair(&mut a, &mut b, TickId(t));
    }

    let json = serde_json::to_string(&(a.save(), b.save())).unwrap();
    let (sa, sb): (NodeState<FlowSnapshot>, NodeState<FlowSnapshot>) = serde_json::from_str(&json).unwrap();
    let mut ra = flow_node(1, 0.0);
    let mut rb = flow_node(2, 0.0);
    ra.load(&sa).unwrap();
    rb.load(&sb).unwrap();
    assert_eq!(ra.extension(), a.extension());

    for t in 7..=30 {
        tick_pair(&mut a, &mut b, TickId(t));
        tick_pair(&mut ra, &mut rb, TickId(t));
    }
    assert_eq!(ra.save(), a.save());
    assert_eq!(rb.save(), b.save());
}

#[test]
fn load_into_wrong_shape_is_rejected() {
    let mut a = flow_node(1, 20.0);
    let mut state = a.save();
    state.conductor.pending_flow.push(0.0);
    assert_eq!(
        a.load(&state),
        Err(StateError::PortCountMismatch {
            expected: 1,
            found: 2
        })
    );

    let mut state = a.save();
    state.extension.charge = 1001;
    assert!(matches!(
        a.load(&state),
        Err(StateError::OutOfRange { field: "charge", .. })
    ));
    assert_eq!(a.conductor().settled_voltage(), 20.0);
}
