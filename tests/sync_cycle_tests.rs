//! End-to-end bus cycle tests against the simulated Centipede board.

use arcade_ict::board_config::BoardProfile;
use arcade_ict::components::clock::Phi0Clock;
use arcade_ict::components::common::port_wiring::DataBusWiring;
use arcade_ict::components::cpu::sync_cycle::SyncPhase;
use arcade_ict::strategy::{MemoryStrategy, Strategy};
use arcade_ict::systems::arcade_board::RegionTiming;
use arcade_ict::{
    Access, ArcadeBoard, BusCpu, BusError, ControlLine, Mos6502Tester, PinMappedBus, PinValue,
};

type Tester = Mos6502Tester<PinMappedBus<ArcadeBoard>>;

const PERIOD_PS: u64 = Phi0Clock::PERIOD_1_5MHZ_PS;

fn centipede() -> (BoardProfile, Tester) {
    let profile = BoardProfile::centipede();
    let board = ArcadeBoard::for_profile(&profile);
    let tester = Mos6502Tester::from_profile(board, &profile).unwrap();
    (profile, tester)
}

fn rw_level(tester: &Tester) -> PinValue {
    let pin = tester.platform().pin_map().control_pin(ControlLine::ReadWrite);
    tester.platform().level(pin)
}

#[cfg(feature = "synchronized-cycle")]
#[cfg(test)]
mod video_ram_tests {
    use super::*;

    #[test]
    fn test_round_trip_at_every_phase() {
        let (_, mut tester) = centipede();
        for step in 0..32u64 {
            let address = 0x0400 + (step as u32) * 0x1F;
            let value = (step as u8).wrapping_mul(37) ^ 0x5A;

            tester.platform_mut().clock_mut().shift_phase(PERIOD_PS / 32 + 7_919);
            tester.memory_write(address, value).unwrap();
            assert_eq!(tester.platform().memory().read(address as u16), value);

            tester.platform_mut().clock_mut().shift_phase(PERIOD_PS / 7);
            assert_eq!(tester.memory_read(address).unwrap(), value, "address {:04X}", address);
        }
        assert_eq!(tester.platform().stats().mistimed_accesses, 0);
    }

    #[test]
    fn test_top_and_bottom_of_video_ram() {
        let (_, mut tester) = centipede();
        for address in [0x0400u32, 0x07FF] {
            tester.memory_write(address, 0xA5).unwrap();
            assert_eq!(tester.memory_read(address).unwrap(), 0xA5);
        }
    }

    #[test]
    fn test_no_phase_state_carries_between_calls() {
        let (profile, mut tester) = centipede();
        tester.platform_mut().memory_mut().write(0x0480, 0x3C);
        assert_eq!(tester.memory_read(0x0480).unwrap(), 0x3C);

        let snapshot = tester.platform().clone();
        let shift = PERIOD_PS / 3;

        tester.platform_mut().clock_mut().shift_phase(shift);
        let start = tester.platform().now_ps();
        let first = tester.memory_read(0x0480).unwrap();
        let first_elapsed = tester.platform().now_ps() - start;

        // Same board state and phase, fresh tester.
        let mut fresh = Mos6502Tester::from_profile(snapshot, &profile).unwrap();
        fresh.platform_mut().clock_mut().shift_phase(shift);
        let start = fresh.platform().now_ps();
        let second = fresh.memory_read(0x0480).unwrap();
        let second_elapsed = fresh.platform().now_ps() - start;

        assert_eq!(first, 0x3C);
        assert_eq!(second, 0x3C);
        assert_eq!(first_elapsed, second_elapsed);
    }

    #[test]
    fn test_cycle_time_is_bounded_for_any_phase() {
        let (_, mut tester) = centipede();
        tester.platform_mut().memory_mut().write(0x0600, 0x77);
        for step in 0..24u64 {
            tester.platform_mut().clock_mut().set_phase(step * PERIOD_PS / 24);
            let start = tester.platform().now_ps();
            assert_eq!(tester.memory_read(0x0600).unwrap(), 0x77);
            let elapsed = tester.platform().now_ps() - start;
            assert!(elapsed < 20_000_000, "took {} ps", elapsed);
        }
    }

    #[test]
    fn test_interrupts_only_disabled_around_synchronized_cycles() {
        let (_, mut tester) = centipede();
        tester.platform_mut().reset_stats();

        for offset in 0..8 {
            tester.memory_write(0x0500 + offset, offset as u8).unwrap();
            tester.memory_read(0x0500 + offset).unwrap();
        }

        let stats = tester.platform().stats();
        assert_eq!(stats.interrupt_disables, 16);
        assert_eq!(stats.phi2_pulses, 16);
        assert_eq!(stats.pulses_with_interrupts_enabled, 0);
        assert_eq!(stats.bus_contentions, 0);
        assert!(tester.platform().interrupts_enabled());
        assert_eq!(rw_level(&tester), PinValue::High);
    }

    #[test]
    fn test_single_wait_on_skipping_clock_reads_wrong_data() {
        // Tester told the clock is whole while the board drops pulses.
        let mut profile = BoardProfile::centipede();
        let board = ArcadeBoard::for_profile(&profile);
        profile.strategies = vec![
            MemoryStrategy::uniform(0x0400, 0x0400, Strategy::SyncPhi0),
            MemoryStrategy::END,
        ];
        let mut tester = Mos6502Tester::from_profile(board, &profile).unwrap();
        tester.platform_mut().memory_mut().write(0x0440, 0x0F);

        for step in 0..8u64 {
            tester.platform_mut().clock_mut().shift_phase(step * 83_333);
            let data = tester.memory_read(0x0440).unwrap();
            assert_eq!(data, 0xF0);
        }

        tester.memory_write(0x0441, 0x12).unwrap();
        assert_eq!(tester.platform().memory().read(0x0441), 0x00);
    }

    #[test]
    fn test_single_wait_works_on_a_whole_clock() {
        let mut profile = BoardProfile::centipede();
        let board = ArcadeBoard::new(
            profile.pins.clone(),
            profile.wiring.clone(),
            &profile.calibration,
        )
        .with_region(0x0400, 0x0400, RegionTiming::Phi0 { skip_alternate: false });
        profile.strategies = vec![
            MemoryStrategy::uniform(0x0400, 0x0400, Strategy::SyncPhi0),
            MemoryStrategy::END,
        ];
        let mut tester = Mos6502Tester::from_profile(board, &profile).unwrap();

        for step in 0..96u64 {
            let address = 0x0400 + (step as u32 * 11) % 0x0400;
            let value = (step as u8).wrapping_mul(29) ^ 0xC3;

            tester.platform_mut().clock_mut().set_phase(step * PERIOD_PS / 96);
            tester.memory_write(address, value).unwrap();
            tester.platform_mut().clock_mut().shift_phase(PERIOD_PS / 5 + step * 1_009);
            assert_eq!(tester.memory_read(address).unwrap(), value, "step {}", step);
        }
        assert_eq!(tester.platform().stats().mistimed_accesses, 0);
    }

    #[test]
    fn test_tester_built_without_profile_drives_the_address_bus() {
        let profile = BoardProfile::centipede();
        let board = ArcadeBoard::for_profile(&profile);
        let bus = PinMappedBus::new(board, profile.pins.clone()).unwrap();
        let mut tester = Mos6502Tester::new(
            bus,
            &profile.strategies,
            profile.wiring.clone(),
            profile.calibration,
        );

        tester.memory_write(0x0450, 0x5E).unwrap();
        assert_eq!(tester.platform().memory().read(0x0450), 0x5E);
        assert_eq!(tester.platform().memory().read(0x0000), 0x00);
        assert_eq!(tester.memory_read(0x0450).unwrap(), 0x5E);
    }

    #[test]
    fn test_skip_variant_also_works_on_a_whole_clock() {
        let profile = BoardProfile::centipede();
        let board = ArcadeBoard::new(
            profile.pins.clone(),
            profile.wiring.clone(),
            &profile.calibration,
        )
        .with_region(0x0400, 0x0400, RegionTiming::Phi0 { skip_alternate: false });
        let mut tester = Mos6502Tester::from_profile(board, &profile).unwrap();

        for step in 0..8u32 {
            tester.platform_mut().clock_mut().shift_phase(97_003);
            tester.memory_write(0x0700 + step, 0xC0 | step as u8).unwrap();
            assert_eq!(tester.memory_read(0x0700 + step).unwrap(), 0xC0 | step as u8);
        }
    }

    #[test]
    fn test_asynchronous_cycle_on_video_ram_is_mistimed() {
        let (mut profile, _) = centipede();
        let board = ArcadeBoard::for_profile(&profile);
        profile.strategies = vec![MemoryStrategy::END];
        let mut tester = Mos6502Tester::from_profile(board, &profile).unwrap();

        for step in 0..16u64 {
            tester.platform_mut().clock_mut().shift_phase(step * 41_667);
            tester.memory_read(0x0400).unwrap();
        }
        assert!(tester.platform().stats().mistimed_accesses > 0);
    }

    #[test]
    fn test_polarity_comes_from_wiring() {
        let profile = BoardProfile::centipede();
        let mut inverted_bits = *profile.wiring.bits();
        for bit in inverted_bits.iter_mut() {
            bit.active_low = true;
        }
        let inverted = DataBusWiring::new(inverted_bits).unwrap();

        // Board wired active-low and tester told so: data survives.
        let board = ArcadeBoard::new(profile.pins.clone(), inverted.clone(), &profile.calibration)
            .with_region(0x0400, 0x0400, RegionTiming::Phi0 { skip_alternate: true });
        let mut matched = profile.clone();
        matched.wiring = inverted.clone();
        let mut tester = Mos6502Tester::from_profile(board, &matched).unwrap();
        tester.platform_mut().memory_mut().write(0x0410, 0x6D);
        assert_eq!(tester.memory_read(0x0410).unwrap(), 0x6D);

        // Tester assumes the wrong polarity: every bit comes back inverted.
        let board = ArcadeBoard::for_profile(&profile);
        let mut wrong = profile.clone();
        wrong.wiring = inverted;
        let mut tester = Mos6502Tester::from_profile(board, &wrong).unwrap();
        tester.platform_mut().memory_mut().write(0x0410, 0x6D);
        assert_eq!(tester.memory_read(0x0410).unwrap(), !0x6Du8);
    }
}

#[cfg(feature = "synchronized-cycle")]
#[cfg(test)]
mod no_clock_tests {
    use super::*;

    fn assert_gives_up(level: PinValue) {
        let (profile, mut tester) = centipede();
        tester.platform_mut().clock_mut().stop(level);
        let start = tester.platform().now_ps();

        let err = tester.memory_read(0x0400).unwrap_err();
        assert!(matches!(
            err,
            BusError::NoClockDetected {
                phase: SyncPhase::CoarseAcquire,
                ..
            }
        ));

        let cal = profile.calibration;
        let budget_ps = cal.ticks_to_ps(cal.max_acquisition_polls() * cal.sync_ruler_ticks);
        assert!(tester.platform().now_ps() - start <= budget_ps);
        assert!(tester.platform().interrupts_enabled());
        assert_eq!(tester.platform().stats().phi2_pulses, 0);

        assert!(matches!(
            tester.memory_write(0x0400, 0x01),
            Err(BusError::NoClockDetected { .. })
        ));
        assert_eq!(rw_level(&tester), PinValue::High);
        assert_eq!(tester.platform().memory().read(0x0400), 0x00);
    }

    #[test]
    fn test_clock_stuck_low() {
        assert_gives_up(PinValue::Low);
    }

    #[test]
    fn test_clock_stuck_high() {
        assert_gives_up(PinValue::High);
    }

    #[test]
    fn test_program_ram_still_works_without_clock() {
        let (_, mut tester) = centipede();
        tester.platform_mut().clock_mut().stop(PinValue::Low);
        tester.memory_write(0x0010, 0x44).unwrap();
        assert_eq!(tester.memory_read(0x0010).unwrap(), 0x44);
    }
}

#[cfg(test)]
mod capability_tests {
    use super::*;

    #[test]
    fn test_controller_without_port_access() {
        let profile = BoardProfile::centipede();
        let board = ArcadeBoard::for_profile(&profile).without_synchronized_support();
        let mut tester = Mos6502Tester::from_profile(board, &profile).unwrap();

        assert!(!tester.supports_synchronized_cycle());
        assert_eq!(
            tester.memory_write(0x0400, 0x01),
            Err(BusError::NotImplemented {
                access: Access::Write,
                strategy: Strategy::SyncPhi0SkipOnePulse
            })
        );
        assert_eq!(tester.platform().stats().phi2_pulses, 0);
        assert_eq!(tester.platform().memory().read(0x0400), 0x00);

        tester.memory_write(0x03FF, 0x99).unwrap();
        assert_eq!(tester.memory_read(0x03FF).unwrap(), 0x99);
    }

    #[test]
    fn test_tester_built_without_profile_addresses_correctly() {
        let profile = BoardProfile::generic_6502();
        let board = ArcadeBoard::for_profile(&profile);
        let bus = PinMappedBus::new(board, profile.pins.clone()).unwrap();
        let mut tester = Mos6502Tester::new(
            bus,
            &profile.strategies,
            profile.wiring.clone(),
            profile.calibration,
        );

        tester.memory_write(0x0010, 0x44).unwrap();
        assert_eq!(tester.platform().memory().read(0x0010), 0x44);
        assert_eq!(tester.platform().memory().read(0x0000), 0x00);

        tester.platform_mut().memory_mut().write(0x0123, 0x9A);
        assert_eq!(tester.memory_read(0x0123).unwrap(), 0x9A);
        assert_eq!(tester.platform().address(), 0x0123);
    }

    #[test]
    fn test_from_profile_idles_the_socket() {
        let (_, tester) = centipede();
        let board = tester.platform();
        let phi2 = board.pin_map().control_pin(ControlLine::ClockOut);
        assert_eq!(board.level(phi2), PinValue::Low);
        assert_eq!(rw_level(&tester), PinValue::High);
        assert_eq!(board.address(), 0x0000);
    }
}
