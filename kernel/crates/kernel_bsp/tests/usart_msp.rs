//! USART MSP init/deinit against the recording HAL.

mod common;

use common::{Call, MockHal};
use kernel_bsp::clock::{Bus, ClockGate};
use kernel_bsp::gpio::PinConfig;
use kernel_bsp::usart::{usart_msp_deinit, usart_msp_init};
use kernel_bsp::{ConfigError, UsartInstance};

#[test]
fn resolved_resources_are_consistent() {
    for instance in UsartInstance::ALL {
        let res = instance.resources();
        assert_eq!(res.instance, instance);
        assert_eq!(instance.tx_port_clock(), res.tx.port.clock_gate());
        assert_eq!(instance.rx_port_clock(), res.rx.port.clock_gate());
        assert_ne!(res.tx, res.rx);
        assert_eq!(UsartInstance::from_base(res.base), instance);
    }
    assert_eq!(UsartInstance::Usart1.clock(), ClockGate::apb2(14));
    assert_eq!(UsartInstance::Usart2.clock(), ClockGate::apb1(17));
}

#[test]
fn unsupported_identifiers_are_rejected() {
    for n in [0u8, 3, 4, 255] {
        assert_eq!(
            UsartInstance::try_from(n),
            Err(ConfigError::UnsupportedInstance(n))
        );
    }
    assert_eq!(
        UsartInstance::try_from_base(0x4000_0000),
        Err(ConfigError::UnknownBase(0x4000_0000))
    );
}

#[test]
#[should_panic]
fn unsupported_number_takes_fatal_path() {
    let _ = UsartInstance::from_number(0);
}

#[test]
#[should_panic(expected = "no USART at base address")]
fn unknown_base_takes_fatal_path() {
    let _ = UsartInstance::from_base(0x4001_3C00);
}

#[test]
fn msp_init_enables_clocks_before_pins() {
    for instance in UsartInstance::ALL {
        let mut hal = MockHal::new();
        usart_msp_init(&mut hal, instance);

        let res = instance.resources();
        let tx_clock = hal.position(Call::EnableClock(instance.tx_port_clock())).unwrap();
        let rx_clock = hal.position(Call::EnableClock(instance.rx_port_clock())).unwrap();
        let usart_clock = hal.position(Call::EnableClock(res.clock)).unwrap();
        let tx_pin = hal.position(Call::GpioInit(res.tx, PinConfig::USART)).unwrap();
        let rx_pin = hal.position(Call::GpioInit(res.rx, PinConfig::USART)).unwrap();

        assert!(tx_clock < rx_clock || instance.tx_port_clock() == instance.rx_port_clock());
        assert!(rx_clock < usart_clock);
        assert!(usart_clock < tx_pin);
        assert!(tx_pin < rx_pin);
        assert!(hal.is_enabled(res.clock));
    }
}

#[test]
fn port_clock_enable_is_idempotent() {
    let mut hal = MockHal::new();
    usart_msp_init(&mut hal, UsartInstance::Usart1);
    let apb2 = hal.enable_register(Bus::Apb2);

    // TX and RX share port A: the second enable hit the same bit.
    assert_eq!(
        hal.count(Call::EnableClock(UsartInstance::Usart1.tx_port_clock())),
        2
    );
    assert_eq!(apb2, (1 << 2) | (1 << 14));

    usart_msp_init(&mut hal, UsartInstance::Usart1);
    assert_eq!(hal.enable_register(Bus::Apb2), apb2);
}

#[test]
fn usart2_clock_lands_on_apb1() {
    let mut hal = MockHal::new();
    usart_msp_init(&mut hal, UsartInstance::Usart2);
    assert_eq!(hal.enable_register(Bus::Apb1), 1 << 17);
    assert_eq!(hal.enable_register(Bus::Apb2), 1 << 2);
}

#[test]
fn msp_deinit_resets_before_releasing_pins() {
    for instance in UsartInstance::ALL {
        let mut hal = MockHal::new();
        usart_msp_init(&mut hal, instance);
        hal.calls.clear();

        usart_msp_deinit(&mut hal, instance);
        assert_eq!(
            hal.calls,
            [
                Call::PulseReset(instance.reset()),
                Call::GpioInit(instance.tx(), PinConfig::RESET),
                Call::GpioInit(instance.rx(), PinConfig::RESET),
            ]
        );
        assert!(hal.is_enabled(instance.tx_port_clock()));
    }
}

#[test]
#[should_panic(expected = "configured before its port clock")]
fn mock_rejects_pin_config_on_gated_port() {
    use kernel_bsp::BoardHal;

    let mut hal = MockHal::new();
    hal.gpio_init(UsartInstance::Usart1.tx(), PinConfig::USART);
}
