//! System control block and interrupt vector table
//!
//! Boot runs from the flash vector table. Bring-up copies its system
//! exception entries into a RAM table whose external interrupt slots all
//! point at [`irq_stub`], then relocates VTOR there.

use core::sync::atomic::{AtomicU32, Ordering};

use conquer_once::spin::Lazy;
#[cfg(target_arch = "arm")]
use cortex_m::interrupt::InterruptNumber;
#[cfg(target_arch = "arm")]
use cortex_m::peripheral::{NVIC, SCB};
use log::debug;
use spin::Mutex;

use super::memory_map::{IRQ_COUNT, SCB_BASE, SYSTEM_EXCEPTIONS};
use super::mmio::MmioReg;

mod reg {
    #[cfg(not(target_arch = "arm"))]
    pub const VTOR: usize = 0x08;
    pub const AIRCR: usize = 0x0C;
}

mod aircr {
    pub const VECTKEY: u32 = 0x05FA << 16;
    pub const VECTKEY_MASK: u32 = 0xFFFF << 16;
    pub const PRIGROUP: (u32, u32) = (0b111 << 8, 8);
    #[cfg(not(target_arch = "arm"))]
    pub const SYSRESETREQ: u32 = 1 << 2;
}

/// PRIGROUP value giving 4 bits of preemption priority and no subpriority.
pub const PRIORITY_GROUP_4: u32 = 3;

const VECTOR_COUNT: usize = SYSTEM_EXCEPTIONS + IRQ_COUNT;

/// VTOR needs the table aligned to its size rounded up to a power of two.
#[repr(C, align(256))]
struct VectorTable([u32; VECTOR_COUNT]);

static RAM_VECTORS: Lazy<Mutex<VectorTable>> =
    Lazy::new(|| Mutex::new(VectorTable([0; VECTOR_COUNT])));

/// Interrupts that fired with no driver attached.
static UNHANDLED: AtomicU32 = AtomicU32::new(0);

pub fn unhandled_interrupts() -> u32 {
    UNHANDLED.load(Ordering::Relaxed)
}

/// External interrupt line, numbered from 0 after the system exceptions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Irq(u16);

impl Irq {
    /// The line behind exception number `vector`, if it is an external one.
    pub fn from_vector(vector: usize) -> Option<Self> {
        vector
            .checked_sub(SYSTEM_EXCEPTIONS)
            .filter(|&irq| irq < IRQ_COUNT)
            .map(|irq| Self(irq as u16))
    }
}

// Safety: every `Irq` built by `from_vector` is below IRQ_COUNT.
#[cfg(target_arch = "arm")]
unsafe impl InterruptNumber for Irq {
    fn number(self) -> u16 {
        self.0
    }
}

/// Placeholder for every external interrupt. Masks the line so an
/// unclaimed source cannot storm.
pub extern "C" fn irq_stub() {
    #[cfg(target_arch = "arm")]
    {
        const ICSR_VECTACTIVE: u32 = 0x1FF;
        // Safety: ICSR is read-only state of the running exception
        let vector = unsafe { (*SCB::PTR).icsr.read() } & ICSR_VECTACTIVE;
        if let Some(irq) = Irq::from_vector(vector as usize) {
            NVIC::mask(irq);
        }
    }
    UNHANDLED.fetch_add(1, Ordering::Relaxed);
}

/// The SCB registers this kernel uses
pub struct Scb {
    base: usize,
}

impl Scb {
    /// # Safety
    ///
    /// Only one `Scb` may exist outside of the reset path.
    pub const unsafe fn new() -> Self {
        Self { base: SCB_BASE }
    }

    pub fn set_vector_table(&self, addr: usize) {
        #[cfg(target_arch = "arm")]
        {
            // Safety: only ever pointed at the flash table or RAM_VECTORS
            unsafe { (*SCB::PTR).vtor.write(addr as u32) }
        }
        #[cfg(not(target_arch = "arm"))]
        self.reg(reg::VTOR).write(addr as u32);
    }

    pub fn vector_table(&self) -> usize {
        // Safety: plain read of a core register
        #[cfg(target_arch = "arm")]
        let vtor = unsafe { (*SCB::PTR).vtor.read() };
        #[cfg(not(target_arch = "arm"))]
        let vtor = self.reg(reg::VTOR).read();
        vtor as usize
    }

    pub fn set_priority_grouping(&self, group: u32) {
        self.reg(reg::AIRCR).modify(|v| {
            let keep = v & !(aircr::VECTKEY_MASK | aircr::PRIGROUP.0);
            keep | aircr::VECTKEY | ((group << aircr::PRIGROUP.1) & aircr::PRIGROUP.0)
        });
    }

    /// Reset the system. Keeps the priority grouping across the request.
    pub fn request_reset(&self) -> ! {
        #[cfg(target_arch = "arm")]
        SCB::sys_reset();
        #[cfg(not(target_arch = "arm"))]
        {
            self.reg(reg::AIRCR)
                .modify(|v| aircr::VECTKEY | (v & aircr::PRIGROUP.0) | aircr::SYSRESETREQ);
            loop {
                core::hint::spin_loop();
            }
        }
    }

    /// Copy the current table's system exceptions into the RAM table, point
    /// every external interrupt at [`irq_stub`] and relocate VTOR.
    pub fn install_stub_vectors(&self) {
        let mut table = RAM_VECTORS.lock();
        let current = self.vector_table();
        for (i, slot) in table.0.iter_mut().enumerate() {
            *slot = if i < SYSTEM_EXCEPTIONS {
                // Safety: VTOR points at a valid table of at least 16 words
                unsafe { MmioReg::<u32>::new(current + i * 4).read() }
            } else {
                irq_stub as usize as u32
            };
        }
        let addr = table.0.as_ptr() as usize;
        self.set_vector_table(addr);
        debug!("{IRQ_COUNT} interrupt vectors stubbed, VTOR={addr:#010x}");
    }

    fn reg(&self, offset: usize) -> MmioReg<u32> {
        unsafe { MmioReg::new(self.base + offset) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_external_vectors_map_to_lines() {
        assert_eq!(Irq::from_vector(3), None);
        assert_eq!(Irq::from_vector(SYSTEM_EXCEPTIONS), Some(Irq(0)));
        // USART1
        assert_eq!(Irq::from_vector(53), Some(Irq(37)));
        assert_eq!(Irq::from_vector(SYSTEM_EXCEPTIONS + IRQ_COUNT), None);
    }

    #[test]
    fn vector_table_fits_its_alignment() {
        assert!(core::mem::size_of::<VectorTable>() <= core::mem::align_of::<VectorTable>());
        assert!(core::mem::align_of::<VectorTable>() >= 128);
    }
}
