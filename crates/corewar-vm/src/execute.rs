//! Single-process execution step.
//!
//! One call pops the front process of a queue, resolves both operands,
//! dispatches on the opcode, and re-queues the continuation unless the
//! process died. Every observable effect is recorded in the player's
//! [`StepReport`].

use std::collections::BTreeSet;

use crate::core::{Core, Cursor};
use crate::instruction::{AddressMode, Instruction, Modifier, OpCode};
use crate::process::ProcessQueue;
use crate::report::{KillCause, ProcessEvent, StepReport};

/// Resolves an operand to the cell it designates.
///
/// Indirect modes read the intermediate cell at `pc + value` and offset from
/// it by that cell's A- or B-field. Every cell touched is added to `reads`.
#[must_use]
pub fn resolve_operand(
    core: &Core,
    pc: Cursor,
    mode: AddressMode,
    value: u32,
    reads: &mut BTreeSet<u32>,
) -> Cursor {
    let target = match mode {
        AddressMode::Immediate => pc,
        AddressMode::Direct => pc + value,
        AddressMode::AIndirect => {
            let pointer = pc + value;
            reads.insert(pointer.position());
            pointer + core[pointer].a_val
        }
        AddressMode::BIndirect => {
            let pointer = pc + value;
            reads.insert(pointer.position());
            pointer + core[pointer].b_val
        }
    };
    reads.insert(target.position());
    target
}

/// Executes the front process of `queue` once.
///
/// Returns `false` without side effects when the queue is empty.
pub fn step_process(
    core: &mut Core,
    queue: &mut ProcessQueue,
    max_processes: usize,
    report: &mut StepReport,
) -> bool {
    let Some(pc) = queue.pop() else {
        return false;
    };
    let size = core.size();
    let current = core[pc];

    report.executed_address = Some(pc.position());
    report.executed_instruction = Some(current);

    let mut reads = BTreeSet::new();
    reads.insert(pc.position());
    let source_ptr = resolve_operand(core, pc, current.a_mode, current.a_val, &mut reads);
    let dest_ptr = resolve_operand(core, pc, current.b_mode, current.b_val, &mut reads);
    report.read_addresses = reads;

    let source = core[source_ptr];
    let dest = core[dest_ptr];
    let next = pc.successor();

    match current.op {
        OpCode::Kil => {
            report.event = Some(ProcessEvent::Killed(KillCause::Kil));
        }
        OpCode::Frk => {
            queue.push(next);
            if queue.len() < max_processes {
                queue.push(source_ptr);
                report.event = Some(ProcessEvent::Forked {
                    address: source_ptr.position(),
                });
            } else {
                tracing::debug!(
                    address = pc.position(),
                    max_processes,
                    "fork dropped at process cap"
                );
                report.event = Some(ProcessEvent::ForkDropped);
            }
        }
        OpCode::Nop => queue.push(next),
        OpCode::Mov => {
            core[dest_ptr] = copy_fields(&source, &dest, current.modifier);
            report.write_address = Some(dest_ptr.position());
            queue.push(next);
        }
        OpCode::Add | OpCode::Sub | OpCode::Mul | OpCode::Div | OpCode::Mod => {
            let outcome = combine_fields(current.op, &source, &dest, current.modifier, size);
            if outcome.written {
                core[dest_ptr] = outcome.cell;
                report.write_address = Some(dest_ptr.position());
            }
            if outcome.divide_by_zero {
                report.event = Some(ProcessEvent::Killed(KillCause::DivisionByZero));
            } else {
                queue.push(next);
            }
        }
        OpCode::Jmp => queue.push(source_ptr),
        OpCode::Jmz => {
            let taken = current
                .modifier
                .destination_fields()
                .iter()
                .all(|field| dest.field(*field) == 0);
            queue.push(if taken { source_ptr } else { next });
        }
        OpCode::Jmn => {
            let taken = current
                .modifier
                .destination_fields()
                .iter()
                .all(|field| dest.field(*field) != 0);
            queue.push(if taken { source_ptr } else { next });
        }
        OpCode::Beq => {
            let skip = operands_equal(&source, &dest, current.modifier);
            queue.push(if skip { next.successor() } else { next });
        }
        OpCode::Bne => {
            let skip = !operands_equal(&source, &dest, current.modifier);
            queue.push(if skip { next.successor() } else { next });
        }
        OpCode::Blt => {
            let skip = current
                .modifier
                .field_pairs()
                .iter()
                .all(|(from, to)| dest.field(*to) > source.field(*from));
            queue.push(if skip { next.successor() } else { next });
        }
    }

    report.process_count = queue.len();

    if let Some(ProcessEvent::Killed(cause)) = report.event {
        tracing::debug!(address = pc.position(), ?cause, remaining = queue.len(), "process killed");
    }
    tracing::trace!(address = pc.position(), instruction = %current, "step");
    true
}

fn copy_fields(source: &Instruction, dest: &Instruction, modifier: Modifier) -> Instruction {
    if modifier == Modifier::I {
        return *source;
    }
    let mut cell = *dest;
    for (from, to) in modifier.field_pairs() {
        cell.set_field(*to, source.field(*from));
    }
    cell
}

struct Combined {
    cell: Instruction,
    written: bool,
    divide_by_zero: bool,
}

fn combine_fields(
    op: OpCode,
    source: &Instruction,
    dest: &Instruction,
    modifier: Modifier,
    size: u32,
) -> Combined {
    let mut combined = Combined {
        cell: *dest,
        written: false,
        divide_by_zero: false,
    };
    for (from, to) in modifier.field_pairs() {
        match arithmetic(op, dest.field(*to), source.field(*from), size) {
            Some(value) => {
                combined.cell.set_field(*to, value);
                combined.written = true;
            }
            None => combined.divide_by_zero = true,
        }
    }
    combined
}

/// Applies an arithmetic opcode modulo `size`; `None` on a zero divisor.
#[allow(clippy::cast_possible_truncation)]
fn arithmetic(op: OpCode, dest: u32, source: u32, size: u32) -> Option<u32> {
    let size = u64::from(size);
    let dest = u64::from(dest) % size;
    let source = u64::from(source) % size;
    let value = match op {
        OpCode::Add => (dest + source) % size,
        OpCode::Sub => (size + dest - source) % size,
        OpCode::Mul => (dest * source) % size,
        OpCode::Div => dest.checked_div(source)?,
        OpCode::Mod => dest.checked_rem(source)?,
        _ => dest,
    };
    Some(value as u32)
}

fn operands_equal(source: &Instruction, dest: &Instruction, modifier: Modifier) -> bool {
    if modifier == Modifier::I {
        return source == dest;
    }
    modifier
        .field_pairs()
        .iter()
        .all(|(from, to)| source.field(*from) == dest.field(*to))
}
