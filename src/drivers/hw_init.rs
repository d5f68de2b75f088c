//! One-shot hardware peripheral initialization.
//!
//! Configures the trigger inputs and the status LED with raw ESP-IDF sys
//! calls and registers the input ISRs.  Called once from `main()` before
//! the dispatch loop starts.

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

#[cfg(target_os = "espidf")]
use log::info;

use crate::drivers::inputs::InputWatcher;
#[cfg(target_os = "espidf")]
use crate::drivers::inputs::InputLine;
#[cfg(target_os = "espidf")]
use crate::pins;

// ── Error type ────────────────────────────────────────────────

/// Errors during one-shot peripheral initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HwInitError {
    GpioConfigFailed(i32),
    IsrInstallFailed(i32),
    IsrAddFailed(i32),
}

impl core::fmt::Display for HwInitError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::GpioConfigFailed(rc) => write!(f, "GPIO config failed (rc={})", rc),
            Self::IsrInstallFailed(rc) => write!(f, "GPIO ISR service install failed (rc={})", rc),
            Self::IsrAddFailed(rc) => write!(f, "GPIO ISR handler add failed (rc={})", rc),
        }
    }
}

#[cfg(target_os = "espidf")]
pub fn init_peripherals() -> Result<(), HwInitError> {
    let inputs = (1u64 << pins::INPUT_1_GPIO) | (1u64 << pins::INPUT_2_GPIO);
    // The inputs are driven by external circuitry: no internal pulls.
    configure_pins(inputs, gpio_mode_t_GPIO_MODE_INPUT)?;
    configure_pins(1u64 << pins::STATUS_LED_GPIO, gpio_mode_t_GPIO_MODE_OUTPUT)?;
    gpio_write(pins::STATUS_LED_GPIO, false);
    info!(
        "hw_init: inputs GPIO{}/GPIO{}, status LED GPIO{}",
        pins::INPUT_1_GPIO,
        pins::INPUT_2_GPIO,
        pins::STATUS_LED_GPIO
    );
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn init_peripherals() -> Result<(), HwInitError> {
    log::info!("hw_init(sim): peripheral init skipped");
    Ok(())
}

/// Plain push-pull / floating configuration, interrupts off.
#[cfg(target_os = "espidf")]
fn configure_pins(mask: u64, mode: gpio_mode_t) -> Result<(), HwInitError> {
    let cfg = gpio_config_t {
        pin_bit_mask: mask,
        mode,
        pull_up_en: gpio_pullup_t_GPIO_PULLUP_DISABLE,
        pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
        intr_type: gpio_int_type_t_GPIO_INTR_DISABLE,
    };
    // SAFETY: called once from main() before the dispatch loop starts.
    match unsafe { gpio_config(&cfg) } {
        rc if rc == ESP_OK as i32 => Ok(()),
        rc => Err(HwInitError::GpioConfigFailed(rc)),
    }
}

// ── Pin access ────────────────────────────────────────────────

/// Level of a configured input.  ISR-safe.
#[cfg(target_os = "espidf")]
pub fn gpio_read(pin: i32) -> bool {
    // SAFETY: register read on a configured pin.
    unsafe { gpio_get_level(pin) != 0 }
}

#[cfg(target_os = "espidf")]
pub fn gpio_write(pin: i32, high: bool) {
    // SAFETY: register write on a configured output pin.
    unsafe {
        gpio_set_level(pin, u32::from(high));
    }
}

#[cfg(not(target_os = "espidf"))]
pub fn gpio_write(_pin: i32, _high: bool) {}

// ── GPIO ISR Service ──────────────────────────────────────────

#[cfg(target_os = "espidf")]
unsafe extern "C" fn input_gpio_isr(arg: *mut core::ffi::c_void) {
    // SAFETY: `arg` is the `&'static InputLine` registered in
    // init_isr_service(); it is never freed.
    let line = unsafe { &*(arg as *const InputLine) };
    // SAFETY: RTC counter read; ISR-safe.
    let now_ms = (unsafe { esp_timer_get_time() } / 1_000) as u32;
    let high = gpio_read(line.gpio());
    line.on_edge(now_ms, high);
}

/// Install the per-pin GPIO ISR service and hook up both trigger inputs.
/// Call after init_peripherals() and before the dispatch loop.
#[cfg(target_os = "espidf")]
pub fn init_isr_service(watcher: &'static InputWatcher) -> Result<(), HwInitError> {
    // SAFETY: gpio_install_isr_service is idempotent; ESP_ERR_INVALID_STATE
    // means it was already installed.  The handler argument outlives the ISR.
    unsafe {
        let ret = gpio_install_isr_service(0);
        if ret != ESP_OK as i32 && ret != ESP_ERR_INVALID_STATE as i32 {
            return Err(HwInitError::IsrInstallFailed(ret));
        }

        for line in watcher.lines() {
            let pin = line.gpio();
            gpio_set_intr_type(pin, gpio_int_type_t_GPIO_INTR_ANYEDGE);
            let arg = line as *const InputLine as *mut core::ffi::c_void;
            let ret = gpio_isr_handler_add(pin, Some(input_gpio_isr), arg);
            if ret != ESP_OK as i32 {
                return Err(HwInitError::IsrAddFailed(ret));
            }
            gpio_intr_enable(pin);
        }
    }
    info!("hw_init: ISR service installed (IN_1=GPIO{}, IN_2=GPIO{})", pins::INPUT_1_GPIO, pins::INPUT_2_GPIO);
    Ok(())
}

/// Host builds feed edges straight into [`InputLine::on_edge`](crate::drivers::inputs::InputLine::on_edge).
#[cfg(not(target_os = "espidf"))]
pub fn init_isr_service(_watcher: &'static InputWatcher) -> Result<(), HwInitError> {
    log::info!("hw_init(sim): ISR service skipped");
    Ok(())
}
