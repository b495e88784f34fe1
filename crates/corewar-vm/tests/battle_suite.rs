//! End-to-end rounds driven through the public virtual machine API.

use proptest as _;
#[cfg(feature = "serde")]
use serde as _;
use thiserror as _;
use tracing as _;

use std::fs::File;

use corewar_vm::{
    write_program, AddressMode, Instruction, KillCause, LoadError, Modifier, OpCode, Player,
    ProcessEvent, RoundState, Ruleset, VirtualMachine, VmConfig,
};
use rstest::rstest;

const CORE: u32 = 100;

fn small_config(max_cycles: u32, max_processes: usize) -> VmConfig {
    VmConfig {
        core_size: CORE,
        max_cycles,
        max_processes,
    }
}

fn ins(op: OpCode, modifier: Modifier, a: (AddressMode, u32), b: (AddressMode, u32)) -> Instruction {
    Instruction::new(op, modifier, a.0, a.1, b.0, b.1)
}

fn kil() -> Instruction {
    Instruction::default()
}

fn self_jump() -> Instruction {
    ins(
        OpCode::Jmp,
        Modifier::B,
        (AddressMode::Direct, 0),
        (AddressMode::Immediate, 0),
    )
}

#[test]
fn two_kil_programs_end_with_player_two_winning() {
    let mut vm = VirtualMachine::new(small_config(1000, 8)).expect("valid config");
    vm.load_program(&[kil()], 10, Player::One).expect("load p1");
    vm.load_program(&[kil()], 60, Player::Two).expect("load p2");

    assert_eq!(vm.execute_cycle(), RoundState::P2Won);
    assert_eq!(
        vm.report(Player::One).event,
        Some(ProcessEvent::Killed(KillCause::Kil))
    );
    assert_eq!(vm.process_count(Player::One), 0);
    assert_eq!(vm.process_count(Player::Two), 1);
}

#[test]
fn lone_self_jump_runs_out_the_clock() {
    let mut vm = VirtualMachine::new(small_config(50, 8)).expect("valid config");
    vm.load_program(&[self_jump()], 0, Player::One).expect("load");

    assert_eq!(vm.run(), RoundState::Draw);
    assert_eq!(vm.current_cycle(), 50);
    assert_eq!(vm.process_count(Player::One), 1);
    assert_eq!(vm.execute_cycle(), RoundState::Draw);
    assert_eq!(vm.current_cycle(), 50);
}

#[test]
fn bomb_lands_on_opponent_before_it_runs() {
    let bomber = [
        ins(
            OpCode::Mov,
            Modifier::I,
            (AddressMode::Direct, 2),
            (AddressMode::Direct, 5),
        ),
        ins(
            OpCode::Jmp,
            Modifier::B,
            (AddressMode::Direct, CORE - 1),
            (AddressMode::Immediate, 0),
        ),
        kil(),
    ];
    let mut vm = VirtualMachine::new(small_config(1000, 8)).expect("valid config");
    vm.load_program(&bomber, 0, Player::One).expect("load p1");
    vm.load_program(&[self_jump()], 5, Player::Two).expect("load p2");

    assert_eq!(vm.execute_cycle(), RoundState::P1Won);

    let attacker = vm.report(Player::One);
    assert_eq!(attacker.executed_address, Some(0));
    assert_eq!(attacker.write_address, Some(5));
    assert!(attacker.read_addresses.contains(&2));

    let victim = vm.report(Player::Two);
    assert_eq!(victim.executed_address, Some(5));
    assert_eq!(victim.executed_instruction, Some(kil()));
    assert_eq!(victim.event, Some(ProcessEvent::Killed(KillCause::Kil)));
}

#[test]
fn division_by_zero_kills_the_dividing_process() {
    let divider = ins(
        OpCode::Div,
        Modifier::AB,
        (AddressMode::Immediate, 0),
        (AddressMode::Direct, 1),
    );
    let mut vm = VirtualMachine::new(small_config(1000, 8)).expect("valid config");
    vm.load_program(&[divider], 0, Player::One).expect("load p1");
    vm.load_program(&[self_jump()], 50, Player::Two).expect("load p2");

    assert_eq!(vm.execute_cycle(), RoundState::P2Won);
    assert_eq!(
        vm.report(Player::One).event,
        Some(ProcessEvent::Killed(KillCause::DivisionByZero))
    );
}

#[test]
fn fork_loop_saturates_at_the_process_cap() {
    let spawner = [
        ins(
            OpCode::Frk,
            Modifier::B,
            (AddressMode::Direct, 0),
            (AddressMode::Immediate, 0),
        ),
        ins(
            OpCode::Jmp,
            Modifier::B,
            (AddressMode::Direct, CORE - 1),
            (AddressMode::Immediate, 0),
        ),
    ];
    let mut vm = VirtualMachine::new(small_config(40, 4)).expect("valid config");
    vm.load_program(&spawner, 0, Player::One).expect("load");

    while vm.execute_cycle() == RoundState::Ongoing {
        assert!(vm.process_count(Player::One) <= 4);
    }
    assert_eq!(vm.round_state(), RoundState::Draw);
    assert_eq!(vm.process_count(Player::One), 4);
}

#[test]
fn imp_overwrites_a_stationary_opponent_and_the_round_draws() {
    let imp = ins(
        OpCode::Mov,
        Modifier::I,
        (AddressMode::Direct, 0),
        (AddressMode::Direct, 1),
    );
    let mut vm = VirtualMachine::new(small_config(30, 8)).expect("valid config");
    vm.load_program(&[imp], 0, Player::One).expect("load p1");
    vm.load_program(&[self_jump()], 5, Player::Two).expect("load p2");

    assert_eq!(vm.run(), RoundState::Draw);
    assert_eq!(vm.core().cells()[5], imp);
    assert_eq!(vm.process_count(Player::One), 1);
    assert_eq!(vm.process_count(Player::Two), 1);
}

#[test]
fn binary_file_loads_like_the_in_memory_program() {
    let program = [
        ins(
            OpCode::Add,
            Modifier::AB,
            (AddressMode::Immediate, 4),
            (AddressMode::Direct, 3),
        ),
        ins(
            OpCode::Mov,
            Modifier::I,
            (AddressMode::Direct, 2),
            (AddressMode::BIndirect, 2),
        ),
        ins(
            OpCode::Jmp,
            Modifier::B,
            (AddressMode::Direct, CORE - 2),
            (AddressMode::Immediate, 0),
        ),
        kil(),
    ];
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("dwarf.bin");
    let mut file = File::create(&path).expect("create binary");
    write_program(&mut file, &program).expect("write binary");
    drop(file);

    let mut from_file = VirtualMachine::new(small_config(100, 8)).expect("valid config");
    from_file
        .load_program_file(&path, 98, Player::One)
        .expect("load from file");
    let mut from_memory = VirtualMachine::new(small_config(100, 8)).expect("valid config");
    from_memory
        .load_program(&program, 98, Player::One)
        .expect("load from memory");

    assert_eq!(from_file.core(), from_memory.core());
    assert_eq!(
        from_file.queue(Player::One).front(),
        from_memory.queue(Player::One).front()
    );
}

#[test]
fn missing_binary_is_an_io_error() {
    let dir = tempfile::tempdir().expect("temp dir");
    let mut vm = VirtualMachine::new(small_config(100, 8)).expect("valid config");
    let err = vm
        .load_program_file(dir.path().join("absent.bin"), 0, Player::Two)
        .expect_err("file does not exist");
    assert!(matches!(err, LoadError::Io(_)));
    assert!(!vm.is_loaded(Player::Two));
}

#[test]
fn oversized_binary_reads_only_one_record_past_capacity() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("huge.bin");
    let mut file = File::create(&path).expect("create binary");
    write_program(&mut file, &[self_jump(); 1000]).expect("write binary");
    drop(file);

    let mut vm = VirtualMachine::new(VmConfig {
        core_size: 4,
        max_cycles: 10,
        max_processes: 8,
    })
    .expect("valid config");
    let err = vm
        .load_program_file(&path, 0, Player::One)
        .expect_err("binary exceeds the core");
    assert!(matches!(
        err,
        LoadError::TooManyInstructions {
            len: 5,
            core_size: 4
        }
    ));
    assert!(!vm.is_loaded(Player::One));
}

#[test]
fn binary_filling_the_core_exactly_loads() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("full.bin");
    let mut file = File::create(&path).expect("create binary");
    write_program(&mut file, &[self_jump(); 4]).expect("write binary");
    drop(file);

    let mut vm = VirtualMachine::new(VmConfig {
        core_size: 4,
        max_cycles: 10,
        max_processes: 8,
    })
    .expect("valid config");
    vm.load_program_file(&path, 0, Player::One)
        .expect("binary fits");
    assert!(vm.core().cells().iter().all(|cell| *cell == self_jump()));
}

#[rstest]
#[case(Ruleset::Standard, 8000, 80_000)]
#[case(Ruleset::Small, 800, 20_000)]
fn rulesets_size_the_machine(
    #[case] ruleset: Ruleset,
    #[case] core_size: u32,
    #[case] max_cycles: u32,
) {
    let vm = VirtualMachine::new(VmConfig::for_ruleset(ruleset)).expect("valid ruleset");
    assert_eq!(vm.core_size(), core_size);
    assert_eq!(vm.config().max_cycles, max_cycles);
    assert_eq!(vm.config().max_processes, 64);
}
