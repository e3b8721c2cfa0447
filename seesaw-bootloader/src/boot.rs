// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Peripheral quiesce and vector-table handoff.

/// Cortex-M0+ / RP2040 register addresses used during handoff.
const SYST_CSR: *mut u32 = 0xE000_E010 as *mut u32;
const NVIC_ICER: *mut u32 = 0xE000_E180 as *mut u32;
const NVIC_ICPR: *mut u32 = 0xE000_E280 as *mut u32;
const SCB_VTOR: *mut u32 = 0xE000_ED08 as *mut u32;

const RESETS_BASE: u32 = 0x4000_C000;
/// Atomic bit-set alias of the RESETS_RESET register.
const RESETS_RESET_SET: *mut u32 = (RESETS_BASE + 0x2000) as *mut u32;

const RESET_IO_QSPI_BIT: u32 = 1 << 6;
const RESET_PADS_QSPI_BIT: u32 = 1 << 9;
const RESET_PLL_SYS_BIT: u32 = 1 << 12;
const RESET_SYSCFG_BIT: u32 = 1 << 18;

/// All RP2040 peripheral reset bits (RESETS_RESET is 25 bits wide).
const RESET_ALL_BITS: u32 = 0x01FF_FFFF;

/// Quiet the system down before handing over: stop SysTick, disable and
/// clear every NVIC line, and put every peripheral block back into reset
/// except the ones XIP execution depends on (QSPI IO/pads, syscfg, system
/// PLL).
pub fn quiesce() {
    unsafe {
        SYST_CSR.write_volatile(SYST_CSR.read_volatile() & !1);

        NVIC_ICER.write_volatile(0xFFFF_FFFF);
        NVIC_ICPR.write_volatile(0xFFFF_FFFF);

        let keep_running =
            RESET_IO_QSPI_BIT | RESET_PADS_QSPI_BIT | RESET_SYSCFG_BIT | RESET_PLL_SYS_BIT;
        RESETS_RESET_SET.write_volatile(RESET_ALL_BITS & !keep_running);
    }
}

/// Redirect the vector table to `vector_base`, load the application's
/// initial stack pointer and branch to its reset vector.
///
/// # Safety
/// `vector_base` must point at a valid Cortex-M vector table; this never
/// returns and abandons the bootloader's stack.
pub unsafe fn chainload(vector_base: u32) -> ! {
    let initial_sp = (vector_base as *const u32).read_volatile();
    let reset_vector = (vector_base as *const u32).offset(1).read_volatile();

    SCB_VTOR.write_volatile(vector_base);
    cortex_m::asm::dsb();
    cortex_m::asm::isb();

    core::arch::asm!(
        "msr msp, {sp}",
        "bx {reset}",
        sp = in(reg) initial_sp,
        reset = in(reg) reset_vector,
        options(noreturn)
    );
}
