//! The [`Extension`] trait and the [`PoweredNode`] composition.
//!
//! A node's derived state is not layered onto the conductor by
//! overriding its methods. Instead a [`PoweredNode`] owns the base
//! [`Conductor`] next to an extension value, and runs the extension's
//! hooks after each base operation in a fixed order.

use ohm_core::{StateError, TickId};

use crate::conductor::Conductor;
use crate::link::Connectable;
use crate::state::NodeState;
use crate::surge::UpdateReport;

/// Derived per-node state maintained after every relaxation pass.
///
/// # Contract
///
/// - `after_update()` runs once per [`PoweredNode::update`], after the
///   base pass. The conductor is already settled for `tick`.
/// - `check_state()` must accept everything `save()` produces, and
///   must not mutate anything. [`PoweredNode::load`] checks every stage
///   before restoring any of them.
///
/// Pipelines are built from tuples: `(A, B)` runs `A` then `B`, and
/// `()` is the empty pipeline.
///
/// # Examples
///
/// An extension that counts ticks with positive voltage:
///
/// ```
/// use ohm_conductor::{Conductor, Extension, TickId};
///
/// #[derive(Default)]
/// struct Uptime(u64);
///
/// impl Extension for Uptime {
///     type State = u64;
///
///     fn after_update(&mut self, conductor: &mut Conductor, _tick: TickId) {
///         if conductor.settled_voltage() > 0.0 {
///             self.0 += 1;
///         }
///     }
///
///     fn save(&self) -> u64 { self.0 }
///
///     fn restore(&mut self, state: &u64) { self.0 = *state; }
/// }
///
/// let mut uptime = Uptime::default();
/// uptime.load(&7).unwrap();
/// assert_eq!(uptime.save(), 7);
/// ```
pub trait Extension {
    /// Persisted form of this extension.
    type State;

    /// Recompute derived state from the freshly settled conductor.
    fn after_update(&mut self, conductor: &mut Conductor, tick: TickId);

    /// Capture the persisted fields.
    fn save(&self) -> Self::State;

    /// Reject a state this extension cannot represent.
    fn check_state(_state: &Self::State) -> Result<(), StateError> {
        Ok(())
    }

    /// Overwrite from an already checked state.
    fn restore(&mut self, state: &Self::State);

    /// Check then restore.
    fn load(&mut self, state: &Self::State) -> Result<(), StateError> {
        Self::check_state(state)?;
        self.restore(state);
        Ok(())
    }
}

impl Extension for () {
    type State = ();

    fn after_update(&mut self, _conductor: &mut Conductor, _tick: TickId) {}

    fn save(&self) {}

    fn restore(&mut self, _state: &()) {}
}

impl<A: Extension, B: Extension> Extension for (A, B) {
    type State = (A::State, B::State);

    fn after_update(&mut self, conductor: &mut Conductor, tick: TickId) {
        self.0.after_update(conductor, tick);
        self.1.after_update(conductor, tick);
    }

    fn save(&self) -> Self::State {
        (self.0.save(), self.1.save())
    }

    fn check_state(state: &Self::State) -> Result<(), StateError> {
        A::check_state(&state.0)?;
        B::check_state(&state.1)
    }

    fn restore(&mut self, state: &Self::State) {
        self.0.restore(&state.0);
        self.1.restore(&state.1);
    }
}

/// A conductor plus its ordered extension pipeline.
#[derive(Clone, Debug)]
pub struct PoweredNode<E: Extension = ()> {
    conductor: Conductor,
    extension: E,
}

impl<E: Extension> PoweredNode<E> {
    /// Attach `extension` to `conductor`.
    pub fn new(conductor: Conductor, extension: E) -> Self {
        Self {
            conductor,
            extension,
        }
    }

    /// The base conductor.
    pub fn conductor(&self) -> &Conductor {
        &self.conductor
    }

    /// Mutable access to the base conductor, for injection.
    pub fn conductor_mut(&mut self) -> &mut Conductor {
        &mut self.conductor
    }

    /// The extension pipeline.
    pub fn extension(&self) -> &E {
        &self.extension
    }

    /// Mutable access to the extension pipeline.
    pub fn extension_mut(&mut self) -> &mut E {
        &mut self.extension
    }

    /// Split into conductor and extension.
    pub fn into_parts(self) -> (Conductor, E) {
        (self.conductor, self.extension)
    }

    /// Run the base relaxation pass, then every extension in order.
    pub fn update<L: Connectable + ?Sized>(&mut self, link: &mut L) -> UpdateReport {
        let report = self.conductor.update(link);
        self.extension.after_update(&mut self.conductor, report.tick);
        report
    }

    /// Capture base then extension state.
    pub fn save(&self) -> NodeState<E::State> {
        NodeState {
            conductor: self.conductor.save(),
            extension: self.extension.save(),
        }
    }

    /// Restore base then extension state.
    ///
    /// Both parts are checked before either is written, so a rejected
    /// load leaves the node untouched.
    ///
    /// # Errors
    ///
    /// The first [`StateError`] raised by the conductor or any stage.
    pub fn load(&mut self, state: &NodeState<E::State>) -> Result<(), StateError> {
        self.conductor.check_state(&state.conductor)?;
        E::check_state(&state.extension)?;
        self.conductor.restore(&state.conductor);
        self.extension.restore(&state.extension);
        Ok(())
    }
}
