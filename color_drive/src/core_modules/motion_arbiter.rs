// THEORY:
// The `MotionArbiter` is the only stateful stage of the loop. It turns "is there a
// big enough blob this frame?" into start/stop decisions for the motors.
//
// Key architectural principles:
// 1.  **Two States**: `Stopped` (initial) and `Moving`. There is no speed control;
//     the robot either drives forward at a fixed throttle or stands still.
// 2.  **Commands Only on Transition**: a command is produced only when the state
//     changes. Re-sending "forward" every frame would saturate the serial link for
//     no effect, so a steady state produces nothing.
// 3.  **State Mirrors the Wire**: because commands are only produced together with
//     a state change, `state()` always names the last command handed out. The
//     receiver and this model cannot drift apart.
// 4.  **Single Threshold**: one `min_radius` is used in both directions, so a blob
//     hovering right at the threshold can flap between states.
//
// The decision itself is the pure function `transition`; `MotionArbiter` only
// remembers the current state between calls.

use crate::core_modules::blob::Blob;
use crate::core_modules::command::MotionCommand;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MotionState {
    #[default]
    Stopped,
    Moving,
}

/// Computes the next state and the command to emit, if any.
pub fn transition(
    state: MotionState,
    blob: Option<&Blob>,
    min_radius: f32,
    throttle: f32,
) -> (MotionState, Option<MotionCommand>) {
    let target_in_range = blob.is_some_and(|b| b.qualifies(min_radius));
    match (state, target_in_range) {
        (MotionState::Stopped, true) => (MotionState::Moving, Some(MotionCommand::forward(throttle))),
        (MotionState::Moving, false) => (MotionState::Stopped, Some(MotionCommand::stop())),
        (state, _) => (state, None),
    }
}

#[derive(Debug, Clone)]
pub struct MotionArbiter {
    state: MotionState,
    min_radius: f32,
    throttle: f32,
}

impl MotionArbiter {
    pub fn new(min_radius: f32, throttle: f32) -> Self {
        Self {
            state: MotionState::Stopped,
            min_radius,
            throttle,
        }
    }

    pub fn state(&self) -> MotionState {
        self.state
    }

    /// Advances the state machine by one frame.
    pub fn arbitrate(&mut self, blob: Option<&Blob>) -> Option<MotionCommand> {
        let (next, command) = transition(self.state, blob, self.min_radius, self.throttle);
        self.state = next;
        command
    }

    /// Moves to `Stopped` unconditionally and returns the stop command, even if
    /// the arbiter already believes the robot is stopped.
    pub fn force_stop(&mut self) -> MotionCommand {
        self.state = MotionState::Stopped;
        MotionCommand::stop()
    }
}
