//! Host-agnostic input events and the keyboard motor bindings.
//!
//! Keys are matched on their character, case-insensitively:
//!
//! | key | effect                                              |
//! |-----|-----------------------------------------------------|
//! | `M` | arm the base motor and drive it forwards            |
//! | `N` | arm the base motor and drive it backwards           |
//! | `B` | disable the base motor; the yaw limits stay in force |

use physics::{ConstraintId, Scene, SceneError};
use render::PointerButton;

use crate::config::MotorConfig;

#[derive(Clone, Debug, PartialEq)]
pub enum InputEvent {
    Key(char),
    PointerDown { button: PointerButton, x: f32, y: f32 },
    PointerMove { x: f32, y: f32 },
    PointerUp,
    /// Browser convention: positive is scrolling down, away from the scene.
    Wheel { delta_y: f32 },
    Resize { width: u32, height: u32 },
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum MotorCommand {
    Drive { reverse: bool },
    Release,
}

impl MotorCommand {
    #[must_use]
    pub fn from_key(key: char) -> Option<Self> {
        match key.to_ascii_lowercase() {
            'm' => Some(MotorCommand::Drive { reverse: false }),
            'n' => Some(MotorCommand::Drive { reverse: true }),
            'b' => Some(MotorCommand::Release),
            _ => None,
        }
    }

    /// Reconfigures the motor of `joint` on `motor.axis`.
    ///
    /// # Errors
    ///
    /// Whatever the scene rejects; releasing a motor that was never armed
    /// reports [`SceneError::MotorNotConfigured`].
    pub fn apply(
        self,
        scene: &mut Scene,
        joint: ConstraintId,
        motor: &MotorConfig,
    ) -> Result<(), SceneError> {
        match self {
            MotorCommand::Drive { reverse } => {
                let velocity = if reverse {
                    -motor.velocity
                } else {
                    motor.velocity
                };
                scene.update_constraint(joint, |c| {
                    c.configure_angular_motor(
                        motor.axis,
                        motor.low_angle,
                        motor.high_angle,
                        velocity,
                        motor.max_force,
                    )?;
                    c.enable_angular_motor(motor.axis)
                })
            }
            MotorCommand::Release => {
                scene.update_constraint(joint, |c| c.disable_angular_motor(motor.axis))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_match_on_character_in_either_case() {
        assert_eq!(
            MotorCommand::from_key('M'),
            Some(MotorCommand::Drive { reverse: false })
        );
        assert_eq!(
            MotorCommand::from_key('m'),
            Some(MotorCommand::Drive { reverse: false })
        );
        assert_eq!(
            MotorCommand::from_key('n'),
            Some(MotorCommand::Drive { reverse: true })
        );
        assert_eq!(MotorCommand::from_key('B'), Some(MotorCommand::Release));
        assert_eq!(MotorCommand::from_key('x'), None);
        assert_eq!(MotorCommand::from_key('7'), None);
    }
}
