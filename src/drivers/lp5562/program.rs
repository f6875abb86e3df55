//! LP5562 engine program compiler.
//!
//! Turns an [`ActionDescriptor`] plus one channel's drive settings into the
//! micro-program the chip's sequencer runs for that channel.
//!
//! | Instruction      | Encoding                      |
//! |------------------|-------------------------------|
//! | `SetPwm(x)`      | `0x4000 \| x`                 |
//! | `Wait(n)`        | `0x4000 \| n << 8`, n 1..=63  |
//! | `Branch{l, t}`   | `0xA000 \| l << 7 \| t`       |
//! | `End`            | `0xD000`                      |
//!
//! `Branch` with zero loops jumps to `t` forever. A duration is emitted as
//! one maximal `Wait(63)` repeated by a `Branch` when it spans more than one
//! full wait, plus a `Wait` for the leftover steps. The program is built as
//! a typed list and only turned into hex at the end, so the instruction
//! memory limit is a capacity check rather than buffer arithmetic.

use core::fmt::Write as _;

use crate::app::record::{ActionDescriptor, ChannelConfig, MAX_STEP, STEP_TIME};
use crate::error::{ApplyError, LedError, Result};

/// Instruction memory per engine.
pub const MAX_INSTRUCTIONS: usize = 16;
/// Hex characters per engine (four per instruction).
pub const MAX_PROGRAM_HEX: usize = MAX_INSTRUCTIONS * 4;

/// Tenths of a millisecond covered by one `Wait(63)`.
pub const FULL_WAIT_TENTHS: u32 = MAX_STEP * STEP_TIME;

const OP_SET_OR_WAIT: u16 = 0x4000;
const OP_BRANCH: u16 = 0xA000;
const OP_END: u16 = 0xD000;

/// One sequencer instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
    SetPwm(u8),
    Wait(u8),
    Branch { loops: u8, target: u8 },
    End,
}

impl Instruction {
    pub const fn encode(self) -> u16 {
        match self {
            Self::SetPwm(level) => OP_SET_OR_WAIT | level as u16,
            Self::Wait(steps) => OP_SET_OR_WAIT | ((steps as u16 & 0x3F) << 8),
            Self::Branch { loops, target } => {
                OP_BRANCH | ((loops as u16 & 0x3F) << 7) | (target as u16 & 0x7F)
            }
            Self::End => OP_END,
        }
    }
}

/// Split a duration into full-wait repetitions and leftover steps.
///
/// Returns `(loop_time, remainder_steps)` for a duration in tenths of ms.
pub const fn quantize(tenths: u32) -> (u32, u32) {
    (
        tenths / FULL_WAIT_TENTHS,
        (tenths % FULL_WAIT_TENTHS) / STEP_TIME,
    )
}

/// Compiled program for one engine.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EngineProgram {
    instructions: heapless::Vec<Instruction, MAX_INSTRUCTIONS>,
}

impl EngineProgram {
    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// Upper-case hex, four characters per instruction, big endian.
    pub fn to_hex(&self) -> Result<heapless::String<MAX_PROGRAM_HEX>> {
        let mut out = heapless::String::new();
        for ins in &self.instructions {
            write!(out, "{:04X}", ins.encode()).map_err(|_| overflow(self.len() * 4))?;
        }
        Ok(out)
    }

    fn push(&mut self, ins: Instruction) -> Result<()> {
        self.instructions
            .push(ins)
            .map_err(|_| overflow((self.len() + 1) * 4))
    }

    fn next_index(&self) -> u8 {
        self.instructions.len() as u8
    }

    /// Append the waits for a duration given in milliseconds.
    fn push_duration(&mut self, ms: u32) -> Result<()> {
        let (loop_time, rem) = quantize(ms.saturating_mul(10));
        if loop_time > 0 {
            let target = self.next_index();
            self.push(Instruction::Wait(MAX_STEP as u8))?;
            if loop_time > 1 {
                self.push(Instruction::Branch {
                    loops: (loop_time - 1) as u8,
                    target,
                })?;
            }
        }
        if rem > 0 {
            self.push(Instruction::Wait(rem as u8))?;
        }
        Ok(())
    }
}

fn overflow(len: usize) -> LedError {
    ApplyError::ProgramOverflow { len }.into()
}

/// Compile `action` for a single channel.
pub fn compile(action: &ActionDescriptor, channel: ChannelConfig) -> Result<EngineProgram> {
    action.validate()?;

    let mut p = EngineProgram::default();
    match *action {
        ActionDescriptor::On => {
            p.push(Instruction::SetPwm(channel.pwm))?;
            p.push(Instruction::End)?;
        }
        ActionDescriptor::Off => {
            p.push(Instruction::SetPwm(0))?;
            p.push(Instruction::End)?;
        }
        ActionDescriptor::Blink {
            on_time_ms,
            off_time_ms,
        } => {
            p.push(Instruction::SetPwm(channel.pwm))?;
            p.push_duration(on_time_ms)?;
            p.push(Instruction::SetPwm(0))?;
            p.push_duration(off_time_ms)?;
            p.push(Instruction::Branch { loops: 0, target: 0 })?;
            p.push(Instruction::End)?;
        }
        ActionDescriptor::SequenceBlink {
            on_time_ms,
            off1_time_ms,
            repeat_count,
            off2_time_ms,
        } => {
            p.push(Instruction::SetPwm(channel.pwm))?;
            p.push_duration(on_time_ms)?;
            p.push(Instruction::SetPwm(0))?;
            p.push_duration(off1_time_ms)?;
            if repeat_count > 1 {
                p.push(Instruction::Branch {
                    loops: (repeat_count - 1) as u8,
                    target: 0,
                })?;
            }
            p.push(Instruction::SetPwm(0))?;
            p.push_duration(off2_time_ms)?;
            p.push(Instruction::Branch { loops: 0, target: 0 })?;
            p.push(Instruction::End)?;
        }
    }
    Ok(p)
}

/// Compile `action` for red, green and blue in that order.
pub fn compile_channels(
    action: &ActionDescriptor,
    channels: &[ChannelConfig; 3],
) -> Result<[EngineProgram; 3]> {
    Ok([
        compile(action, channels[0])?,
        compile(action, channels[1])?,
        compile(action, channels[2])?,
    ])
}

/// Check that `text` is something the firmware loader accepts.
pub fn validate_program_text(text: &str) -> core::result::Result<(), ApplyError> {
    if text.len() > MAX_PROGRAM_HEX {
        return Err(ApplyError::ProgramOverflow { len: text.len() });
    }
    let well_formed = !text.is_empty()
        && text.len() % 4 == 0
        && text
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'A'..=b'F').contains(&b));
    if well_formed {
        Ok(())
    } else {
        Err(ApplyError::InvalidProgram)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CH: ChannelConfig = ChannelConfig::new(255, 0x35);

    fn hex(action: ActionDescriptor) -> String {
        compile(&action, CH).unwrap().to_hex().unwrap().to_string()
    }

    #[test]
    fn on_and_off_programs() {
        assert_eq!(hex(ActionDescriptor::On), "4035D000");
        assert_eq!(hex(ActionDescriptor::Off), "4000D000");
    }

    #[test]
    fn off_ignores_channel_config() {
        let a = compile(&ActionDescriptor::Off, ChannelConfig::new(1, 2)).unwrap();
        let b = compile(&ActionDescriptor::Off, ChannelConfig::new(200, 99)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn blink_500_1000() {
        // 5000 tenths = 32 steps; 10000 tenths = one full wait + 1 step
        assert_eq!(
            hex(ActionDescriptor::Blink {
                on_time_ms: 500,
                off_time_ms: 1000,
            }),
            "4035600040007F004100A000D000"
        );
    }

    #[test]
    fn long_wait_uses_branch_back_to_full_wait() {
        // 30000 tenths = 3 full waits + 3 steps
        let p = compile(
            &ActionDescriptor::Blink {
                on_time_ms: 3000,
                off_time_ms: 100,
            },
            CH,
        )
        .unwrap();
        assert_eq!(
            &p.instructions()[..4],
            &[
                Instruction::SetPwm(0x35),
                Instruction::Wait(63),
                Instruction::Branch { loops: 2, target: 1 },
                Instruction::Wait(3),
            ]
        );
    }

    #[test]
    fn sequence_with_single_repeat_has_no_inner_branch() {
        let p = compile(
            &ActionDescriptor::SequenceBlink {
                on_time_ms: 200,
                off1_time_ms: 100,
                repeat_count: 1,
                off2_time_ms: 1000,
            },
            CH,
        )
        .unwrap();
        let text = p.to_hex().unwrap();
        assert_eq!(text.as_str(), "40354C004000460040007F004100A000D000");
        let branches = p
            .instructions()
            .iter()
            .filter(|i| matches!(i, Instruction::Branch { loops, .. } if *loops > 0))
            .count();
        assert_eq!(branches, 0);
    }

    #[test]
    fn double_blink_sequence() {
        assert_eq!(
            hex(ActionDescriptor::SequenceBlink {
                on_time_ms: 200,
                off1_time_ms: 100,
                repeat_count: 2,
                off2_time_ms: 1000,
            }),
            "40354C0040004600A08040007F004100A000D000"
        );
    }

    #[test]
    fn worst_case_sequence_fits() {
        let p = compile(
            &ActionDescriptor::SequenceBlink {
                on_time_ms: 61_475,
                off1_time_ms: 61_475,
                repeat_count: 64,
                off2_time_ms: 61_475,
            },
            CH,
        )
        .unwrap();
        assert_eq!(p.len(), 15);
        assert!(p.to_hex().unwrap().len() <= MAX_PROGRAM_HEX);
    }

    #[test]
    fn out_of_range_action_is_invalid_param() {
        let err = compile(
            &ActionDescriptor::Blink {
                on_time_ms: 61_476,
                off_time_ms: 1,
            },
            CH,
        )
        .unwrap_err();
        assert!(matches!(err, LedError::InvalidParam(_)));
    }

    #[test]
    fn quantize_boundaries() {
        assert_eq!(quantize(0), (0, 0));
        assert_eq!(quantize(155), (0, 0));
        assert_eq!(quantize(156), (0, 1));
        assert_eq!(quantize(FULL_WAIT_TENTHS - 1), (0, 62));
        assert_eq!(quantize(FULL_WAIT_TENTHS), (1, 0));
        assert_eq!(quantize(FULL_WAIT_TENTHS + 156), (1, 1));
        assert_eq!(quantize(614_754), (62, 34));
    }

    #[test]
    fn zero_duration_emits_no_wait() {
        let p = compile(
            &ActionDescriptor::Blink {
                on_time_ms: 0,
                off_time_ms: 0,
            },
            CH,
        )
        .unwrap();
        assert_eq!(p.to_hex().unwrap().as_str(), "40354000A000D000");
    }

    #[test]
    fn program_text_validation() {
        assert!(validate_program_text("4035D000").is_ok());
        assert!(matches!(
            validate_program_text("4035d000"),
            Err(ApplyError::InvalidProgram)
        ));
        assert!(validate_program_text("403").is_err());
        assert!(validate_program_text("").is_err());
        assert!(validate_program_text("4035;rm -rf").is_err());
        let long = "4000".repeat(17);
        assert!(matches!(
            validate_program_text(&long),
            Err(ApplyError::ProgramOverflow { len: 68 })
        ));
    }
}
