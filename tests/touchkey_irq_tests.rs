//! Touchkey interrupt path and ESD recovery tests

mod common;

use atlas_drivers::config::PlatformData;
use atlas_drivers::touchkey::{
    BacklightCodes, Health, IrqReturn, KeyEncoding, Power, SharedTouchkey, TouchkeyDevice,
    TouchkeyError,
};
use common::{Event, MockI2c, MockKeys, MockPlatform, NoDelay, Rig, KEYS};

// --- Probe ---

#[test]
fn test_probe_selects_encoding_from_revision() {
    let rig = Rig::new();
    let dev = rig.probe_legacy();
    assert_eq!(dev.encoding(), KeyEncoding::Legacy);
    assert_eq!(dev.backlight_codes(), BacklightCodes::LEGACY);

    let rig = Rig::new();
    let dev = rig.probe_bitmask();
    assert_eq!(dev.encoding(), KeyEncoding::Bitmask);
    assert_eq!(dev.backlight_codes(), BacklightCodes::CURRENT);
    assert_eq!(dev.revision().rev1, 0x0A);
}

#[test]
fn test_probe_force_legacy_overrides_revision() {
    let rig = Rig::new();
    let dev = rig.probe_with([0, 0x0A, 0x00], &PlatformData::atlas(), Rig::config());

    assert_eq!(dev.encoding(), KeyEncoding::Legacy);
    assert_eq!(dev.backlight_codes(), BacklightCodes::LEGACY);
}

#[test]
fn test_probe_rejects_empty_keycodes() {
    let rig = Rig::new();
    let platform = MockPlatform {
        events: rig.events.clone(),
        clock: rig.clock.clone(),
        busy: rig.busy.clone(),
        notification: rig.notification.clone(),
    };
    let keys = MockKeys { events: rig.events.clone() };

    let result = TouchkeyDevice::probe(
        MockI2c::new(),
        NoDelay,
        platform,
        keys,
        &PlatformData::with_keycodes(&[]),
        Rig::config(),
        rig.ring,
    );

    assert!(matches!(result, Err(TouchkeyError::InvalidPlatformData)));
    assert!(rig.events.borrow().is_empty(), "no power switching on bad platform data");
}

#[test]
fn test_probe_version_read_failure_powers_off() {
    let rig = Rig::new();
    let platform = MockPlatform {
        events: rig.events.clone(),
        clock: rig.clock.clone(),
        busy: rig.busy.clone(),
        notification: rig.notification.clone(),
    };
    let keys = MockKeys { events: rig.events.clone() };

    // Bus NACKs everything
    let result = TouchkeyDevice::probe(
        rig.bus.clone(),
        NoDelay,
        platform,
        keys,
        &PlatformData::with_keycodes(&KEYS),
        Rig::config(),
        rig.ring,
    );

    assert!(matches!(result, Err(TouchkeyError::VersionRead(_))));
    assert_eq!(
        rig.take_events(),
        vec![Event::Power(Power::On), Event::Power(Power::Off)]
    );
}

// --- Legacy decoding ---

#[test]
fn test_legacy_press_and_release() {
    let rig = Rig::new();
    let mut dev = rig.probe_legacy();
    rig.take_events();

    rig.bus.push_read(&[0x03]); // key 3 down
    assert_eq!(dev.interrupt(), IrqReturn::WakeThread);
    rig.bus.push_read(&[0x0B]); // key 3 up
    dev.interrupt();

    assert_eq!(rig.key_events(), vec![(158, true), (158, false)]);
    assert_eq!(rig.count(Event::Sync), 2);
    assert_eq!(dev.pressed(), 0);
}

#[test]
fn test_release_trigger_key_notifies_before_press() {
    let rig = Rig::new();
    let mut dev = rig.probe_legacy();
    rig.take_events();

    rig.bus.push_read(&[0x02]); // index 1 down
    dev.interrupt();

    assert_eq!(
        rig.take_events(),
        vec![Event::ForceRelease, Event::Key(102, true), Event::Sync]
    );

    // Release of the same key does not notify again
    rig.bus.push_read(&[0x0A]);
    dev.interrupt();
    assert_eq!(rig.count(Event::ForceRelease), 0);
}

#[test]
fn test_legacy_out_of_range_scancode_dropped() {
    let rig = Rig::new();
    let mut dev = rig.probe_legacy();
    rig.take_events();

    rig.bus.push_read(&[0x05]);
    dev.interrupt();
    rig.bus.push_read(&[0x00]);
    dev.interrupt();

    assert!(rig.events.borrow().is_empty());
    assert!(rig.log_messages().iter().any(|m| m.contains("out of range")));
    assert_eq!(dev.backlight_deadline_us(), None);
}

#[test]
fn test_press_ignored_while_touch_panel_busy() {
    let rig = Rig::new();
    let mut dev = rig.probe_legacy();
    rig.take_events();

    rig.busy.set(true);
    rig.bus.push_read(&[0x01]);
    dev.interrupt();
    assert!(rig.key_events().is_empty());

    // Releases still go through
    rig.bus.push_read(&[0x09]);
    dev.interrupt();
    assert_eq!(rig.key_events(), vec![(139, false)]);
}

// --- Bitmask decoding ---

#[test]
fn test_bitmask_reports_changed_keys_only() {
    let rig = Rig::new();
    let mut dev = rig.probe_bitmask();
    rig.take_events();

    rig.bus.push_read(&[0b0101]);
    dev.interrupt();
    assert_eq!(
        rig.take_events(),
        vec![Event::Key(139, true), Event::Key(158, true), Event::Sync]
    );

    rig.bus.push_read(&[0b0100]);
    dev.interrupt();
    assert_eq!(rig.take_events(), vec![Event::Key(139, false), Event::Sync]);
    assert_eq!(dev.pressed(), 0b0100);

    // No change, no sync
    rig.bus.push_read(&[0b0100]);
    dev.interrupt();
    assert!(rig.take_events().is_empty());
}

// --- Recovery ---

#[test]
fn test_esd_flag_recovers_before_decoding() {
    let rig = Rig::new();
    let mut dev = rig.probe_legacy();
    rig.take_events();

    rig.bus.push_read(&[0x12]); // ESD + key 2 down
    rig.bus.set_idle_status(Some(0x00));
    dev.interrupt();

    let events = rig.take_events();
    let keys_up: Vec<Event> = KEYS.iter().map(|&k| Event::Key(k, false)).collect();
    assert_eq!(&events[..4], &keys_up[..]);
    assert_eq!(
        &events[4..],
        &[Event::Sync, Event::Power(Power::Off), Event::Power(Power::On)]
    );

    assert!(!events.contains(&Event::Key(102, true)));
    assert!(!events.contains(&Event::ForceRelease));

    let health = dev.health();
    assert_eq!(health.state, Health::Normal);
    assert_eq!(health.recoveries, 1);
    assert!(dev.flags().irq_enabled);
}

#[test]
fn test_read_failure_triggers_recovery() {
    let rig = Rig::new();
    let mut dev = rig.probe_legacy();

    rig.bus.push_nack(1);
    rig.bus.push_nack(2); // first two recovery attempts fail
    rig.bus.set_idle_status(Some(0x00));
    dev.interrupt();

    let health = dev.health();
    assert_eq!(health.attempts, 3);
    assert_eq!(health.state, Health::Normal);
    assert!(rig.key_events().iter().all(|&(_, pressed)| !pressed));
}

#[test]
fn test_key_read_during_recovery_is_reported() {
    let rig = Rig::new();
    let mut dev = rig.probe_legacy();
    rig.take_events();

    rig.bus.push_nack(1);
    rig.bus.push_read(&[0x01]); // reread after the power cycle: key 1 down
    dev.interrupt();

    let events = rig.take_events();
    let mut expected: Vec<Event> = KEYS.iter().map(|&k| Event::Key(k, false)).collect();
    expected.extend([
        Event::Sync,
        Event::Power(Power::Off),
        Event::Power(Power::On),
        Event::Key(139, true),
        Event::Sync,
    ]);
    assert_eq!(events, expected);
    assert_eq!(dev.pressed(), 0b0001);
    assert!(dev.backlight_deadline_us().is_some());
}

#[test]
fn test_recover_returns_fresh_status() {
    let rig = Rig::new();
    let mut dev = rig.probe_legacy();

    rig.bus.push_read(&[0x0B]);
    assert_eq!(dev.recover(), Ok(0x0B));
    assert_eq!(dev.health().recoveries, 1);
}

#[test]
fn test_persistent_esd_after_recovery_is_not_decoded() {
    let rig = Rig::new();
    let mut dev = rig.probe_legacy();
    rig.take_events();

    rig.bus.push_read(&[0x11]);
    rig.bus.push_read(&[0x11]); // still in ESD state after the power cycle
    dev.interrupt();

    assert!(!rig.key_events().iter().any(|&(_, pressed)| pressed));
    assert!(rig.log_messages().iter().any(|m| m.contains("ESD state persists")));
}

#[test]
fn test_recovery_gives_up_after_ten_attempts() {
    let rig = Rig::new();
    let mut dev = rig.probe_legacy();
    rig.take_events();

    // Bus dead: every read NACKs
    rig.bus.set_idle_status(None);
    dev.interrupt();

    assert!(dev.is_dead());
    let health = dev.health();
    assert_eq!(health.state, Health::Dead);
    assert_eq!(health.attempts, 10);
    assert_eq!(health.deaths, 1);

    assert_eq!(rig.count(Event::Power(Power::On)), 10);
    assert_eq!(rig.count(Event::Power(Power::Off)), 11);
    assert_eq!(rig.take_events().last(), Some(&Event::Power(Power::Off)));
    assert!(rig.log_messages().iter().any(|m| m == "touchkey died"));
}

#[test]
fn test_dead_device_ignores_interrupts_and_recovery() {
    let rig = Rig::new();
    let mut dev = rig.probe_legacy();
    rig.bus.set_idle_status(None);
    dev.interrupt();
    assert!(dev.is_dead());

    rig.take_events();
    let reads = rig.bus.read_attempts();

    assert_eq!(dev.interrupt(), IrqReturn::Handled);
    assert_eq!(dev.recover(), Err(TouchkeyError::Dead));

    assert_eq!(rig.bus.read_attempts(), reads);
    assert!(rig.take_events().is_empty());
    assert_eq!(dev.health().attempts, 10);
}

#[test]
fn test_resume_revives_dead_device() {
    let rig = Rig::new();
    let mut dev = rig.probe_legacy();
    rig.bus.set_idle_status(None);
    dev.interrupt();
    assert!(dev.is_dead());

    dev.resume();
    assert!(!dev.is_dead());
    assert_eq!(dev.health().state, Health::Normal);

    rig.take_events();
    rig.bus.push_read(&[0x01]);
    dev.interrupt();
    assert_eq!(rig.key_events(), vec![(139, true)]);
}

#[test]
fn test_reinitialize_clears_dead() {
    let rig = Rig::new();
    let mut dev = rig.probe_legacy();
    rig.bus.set_idle_status(None);
    dev.interrupt();

    rig.bus.push_read(&[0, 0x05, 0x00]);
    assert_eq!(dev.reinitialize(), Ok(()));
    assert!(!dev.is_dead());
    assert!(dev.flags().irq_enabled);
    assert_eq!(dev.health().deaths, 1);
}

#[test]
fn test_bus_retries_before_escalating() {
    let rig = Rig::new();
    let config = atlas_drivers::TouchkeyConfig {
        bus_retries: 2,
        ..Rig::config()
    };
    let mut dev = rig.probe_with([0, 0x05, 0x00], &PlatformData::with_keycodes(&KEYS), config);
    rig.take_events();
    let before = rig.bus.read_attempts();

    rig.bus.push_nack(2);
    rig.bus.push_read(&[0x01]);
    dev.interrupt();

    assert_eq!(rig.bus.read_attempts() - before, 3);
    assert_eq!(rig.key_events(), vec![(139, true)]);
    assert_eq!(dev.health().attempts, 0);
}

// --- Powering on ---

#[test]
fn test_interrupt_while_powering_on_is_only_acknowledged() {
    let rig = Rig::new();
    let mut dev = rig.probe_legacy();
    dev.suspend();
    rig.take_events();

    let flags = dev.flags();
    let health = dev.health();
    let reads = rig.bus.read_attempts();

    rig.bus.push_read(&[0x01]);
    assert_eq!(dev.interrupt(), IrqReturn::Handled);

    assert!(rig.take_events().is_empty());
    assert_eq!(dev.flags(), flags);
    assert_eq!(dev.health(), health);
    assert_eq!(rig.bus.read_attempts(), reads);
}

#[test]
fn test_masked_interrupt_is_only_acknowledged() {
    let rig = Rig::new();
    let mut dev = rig.probe_legacy();
    dev.suspend();
    dev.bln_power_on();

    // Powered for the notification, keys still masked
    assert!(!dev.flags().powering_on);
    assert!(!dev.flags().irq_enabled);
    assert_eq!(dev.hard_irq(), IrqReturn::Handled);

    dev.set_enabled(true);
    assert_eq!(dev.hard_irq(), IrqReturn::WakeThread);
}

// --- Shared wrapper ---

#[test]
fn test_shared_touchkey_serializes_access() {
    let rig = Rig::new();
    let shared = SharedTouchkey::new(rig.probe_legacy());

    rig.bus.push_read(&[0x04]);
    assert_eq!(shared.interrupt(), IrqReturn::WakeThread);
    assert_eq!(shared.with(|dev| dev.pressed()), 0b1000);

    let dev = shared.into_inner();
    let (_bus, _delay, _platform, _keys) = dev.remove();
    assert_eq!(rig.key_events(), vec![(217, true), (139, false), (102, false), (158, false), (217, false)]);
}
