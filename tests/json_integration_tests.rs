//! JSON-Based Integration Tests
//!
//! These tests verify that board profiles load from the files shipped in
//! `configs/` and that a loaded profile drives the simulated board the same
//! way the built-in one does.

use arcade_ict::board_config::{BoardFactory, BoardProfile, CpuKind};
use arcade_ict::region::RegionKind;
use arcade_ict::strategy::{lookup, Strategy};
use arcade_ict::systems::arcade_board::MEGA2560_PIN_COUNT;
use arcade_ict::{Access, ArcadeBoard, BusCpu, BusError, ConfigError, Mos6502Tester};

#[cfg(test)]
mod json_system_tests {
    use super::*;

    #[test]
    fn test_centipede_file_matches_builtin_profile() {
        let factory = BoardFactory::new();
        let loaded = factory.load_json("configs/centipede.json").unwrap();
        assert_eq!(loaded, BoardProfile::centipede());
        loaded.validate(MEGA2560_PIN_COUNT).unwrap();
    }

    #[test]
    fn test_generic_profile_runs_on_simulated_board() {
        let factory = BoardFactory::new();
        let profile = factory.load_json("configs/generic_6502.json").unwrap();
        profile.validate(MEGA2560_PIN_COUNT).unwrap();
        assert_eq!(profile, BoardProfile::generic_6502());

        let board = ArcadeBoard::for_profile(&profile);
        let mut tester = Mos6502Tester::from_profile(board, &profile).unwrap();

        let ram: Vec<_> = profile.regions_of(RegionKind::Ram).cloned().collect();
        assert_eq!(ram.len(), 1);
        for address in (u32::from(ram[0].start)..ram[0].end()).step_by(97) {
            tester.memory_write(address, address as u8 ^ 0x3C).unwrap();
            assert_eq!(tester.memory_read(address).unwrap(), address as u8 ^ 0x3C);
        }
        assert_eq!(tester.platform().stats().mistimed_accesses, 0);
        assert_eq!(tester.platform().stats().interrupt_disables, 0);
    }

    #[test]
    fn test_synchronized_range_on_z80_is_rejected() {
        let factory = BoardFactory::new();
        let profile = factory.load_json("configs/z80_with_sync.json").unwrap();
        assert_eq!(profile.cpu, CpuKind::Z80);

        match profile.validate(MEGA2560_PIN_COUNT) {
            Err(ConfigError::SyncOnNonPhi0Cpu { board, strategy, .. }) => {
                assert_eq!(board, "z80-misconfigured");
                assert_eq!(strategy, Strategy::SyncPhi0);
            }
            other => panic!("expected SyncOnNonPhi0Cpu, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_strategy_name_fails_closed() {
        let json = r#"{
            "name": "future-board",
            "cpu": "mos6502",
            "strategies": [
                { "start": 4096, "length": 256, "read": "sync_phi1_stretched", "write": "default" },
                { "start": 0, "length": 0 }
            ]
        }"#;
        let profile = BoardFactory::new().from_json_str(json).unwrap();
        assert_eq!(
            lookup(&profile.strategies, 0x1080),
            (Strategy::Unsupported, Strategy::Default)
        );

        let board = ArcadeBoard::for_profile(&profile);
        let mut tester = Mos6502Tester::from_profile(board, &profile).unwrap();
        assert_eq!(
            tester.memory_read(0x1080),
            Err(BusError::NotImplemented {
                access: Access::Read,
                strategy: Strategy::Unsupported
            })
        );
        assert_eq!(tester.platform().stats().phi2_pulses, 0);

        tester.memory_write(0x1080, 0x21).unwrap();
        assert_eq!(tester.platform().memory().read(0x1080), 0x21);
    }

    #[test]
    fn test_malformed_json() {
        let factory = BoardFactory::new();
        let result = factory.from_json_str(r#"{"name": "broken", "cpu": "#);
        assert!(matches!(result, Err(ConfigError::Json(_))));

        let result = factory.from_json_str(r#"{"name": "nocpu"}"#);
        assert!(matches!(result, Err(ConfigError::Json(_))));
    }

    #[test]
    fn test_wiring_with_shared_bit_is_rejected() {
        let bits: Vec<String> = (0..8)
            .map(|bit| {
                let source_bit = if bit == 1 { 0 } else { bit };
                format!(r#"{{"port": "C", "bit": {}}}"#, source_bit)
            })
            .collect();
        let json = format!(
            r#"{{"name": "crossed", "cpu": "mos6502", "wiring": {{"bits": [{}]}}}}"#,
            bits.join(", ")
        );

        let err = BoardFactory::new().from_json_str(&json).unwrap_err();
        assert!(matches!(err, ConfigError::Json(_)));
        assert!(err.to_string().contains("both read bit"), "{}", err);
    }

    #[test]
    fn test_missing_file() {
        let factory = BoardFactory::new();
        let result = factory.load_json("configs/missing_board.json");
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }
}
