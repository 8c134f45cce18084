//! Mock implementations for testing
//!
//! Host-side stand-ins for the codec shield:
//! - [`SimulatedChip`]: a VS1011e on a shared SPI bus with three select lines
//!   and a DREQ line, recording every protocol violation it observes
//! - [`MemoryStorage`]: an in-memory [`Storage`] with handle counting
//! - [`NoopDelay`]: a delay that only accumulates the requested time

#![cfg(any(test, feature = "std"))]
// test support: fixed-size register and line tables, counters never near overflow
#![allow(clippy::indexing_slicing, clippy::arithmetic_side_effects)]

use core::convert::Infallible;
use std::cell::RefCell;
use std::rc::Rc;
use std::string::String;
use std::vec::Vec;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{self, InputPin, OutputPin};
use embedded_hal::spi::{self, SpiBus};

use crate::gpio::InterruptPin;
use crate::storage::{File, Storage};
use crate::vs1011e::link::CodecLink;
use crate::vs1011e::registers::{Register, OP_READ, OP_WRITE, SDI_CHUNK, SM_RESET};

// ── Simulated chip ───────────────────────────────────────────────────────────

const LINE_CONTROL: usize = 0;
const LINE_DATA: usize = 1;
const LINE_STORAGE: usize = 2;

/// Bus discipline violations observed by [`SimulatedChip`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Violations {
    /// A byte was clocked, or a line lowered, while another line was low.
    pub overlapping_selects: usize,
    /// An SCI byte was clocked without DREQ observed high since the last one.
    pub control_without_ready: usize,
    /// More than 32 SDI bytes were sent on one DREQ-high observation.
    pub data_overrun: usize,
    /// An SDI byte was sent while the DREQ trigger was armed.
    pub data_while_armed: usize,
}

impl Violations {
    /// No violation of any kind.
    pub fn is_clean(&self) -> bool {
        *self == Self::default()
    }
}

struct ChipState {
    registers: [u16; 16],
    lines: [bool; 3],
    frame: Vec<u8>,
    data: Vec<u8>,
    storage_bytes: usize,
    ready_seen: bool,
    data_since_ready: usize,
    capacity: Option<usize>,
    fill: usize,
    decode_per_poll: usize,
    armed: bool,
    arm_count: usize,
    disarm_count: usize,
    violations: Violations,
}

impl ChipState {
    fn new(capacity: Option<usize>, decode_per_poll: usize) -> Self {
        let mut registers = [0u16; 16];
        // SS_VER = 1 (VS1011)
        registers[usize::from(Register::Status.addr())] = 0x0010;
        Self {
            registers,
            lines: [false; 3],
            frame: Vec::new(),
            data: Vec::new(),
            storage_bytes: 0,
            ready_seen: false,
            data_since_ready: 0,
            capacity,
            fill: 0,
            decode_per_poll,
            armed: false,
            arm_count: 0,
            disarm_count: 0,
            violations: Violations::default(),
        }
    }

    fn asserted(&self) -> usize {
        self.lines.iter().filter(|low| **low).count()
    }

    fn free(&self) -> usize {
        self.capacity.map_or(usize::MAX, |cap| cap - self.fill)
    }

    fn poll_ready(&mut self) -> bool {
        if self.free() >= SDI_CHUNK {
            self.ready_seen = true;
            self.data_since_ready = 0;
            true
        } else {
            self.fill = self.fill.saturating_sub(self.decode_per_poll);
            false
        }
    }

    fn clock(&mut self, byte: u8) -> u8 {
        if self.asserted() > 1 {
            self.violations.overlapping_selects += 1;
        }
        if self.lines[LINE_CONTROL] {
            self.control(byte)
        } else if self.lines[LINE_DATA] {
            self.sdi(byte);
            0
        } else {
            if self.lines[LINE_STORAGE] {
                self.storage_bytes += 1;
            }
            0xFF
        }
    }

    fn control(&mut self, byte: u8) -> u8 {
        if !self.ready_seen {
            self.violations.control_without_ready += 1;
        }
        self.ready_seen = false;
        self.frame.push(byte);

        let (op, addr) = match self.frame.as_slice() {
            [op, addr, ..] => (*op, usize::from(*addr & 0x0F)),
            _ => return 0,
        };
        match (op, self.frame.len()) {
            (OP_READ, 3) => self.registers[addr].to_be_bytes()[0],
            (OP_READ, 4) => self.registers[addr].to_be_bytes()[1],
            (OP_WRITE, 4) => {
                let value = u16::from_be_bytes([self.frame[2], self.frame[3]]);
                self.registers[addr] = if addr == usize::from(Register::Mode.addr()) {
                    value & !SM_RESET
                } else {
                    value
                };
                0
            }
            _ => 0,
        }
    }

    fn sdi(&mut self, byte: u8) {
        if self.armed {
            self.violations.data_while_armed += 1;
        }
        self.ready_seen = false;
        self.data_since_ready += 1;
        if self.data_since_ready > SDI_CHUNK {
            self.violations.data_overrun += 1;
        }
        if self.capacity.is_some() {
            self.fill += 1;
        }
        self.data.push(byte);
    }
}

/// A VS1011e model driven through simulated pins and bus.
///
/// Clones share the same chip. The FIFO holds `capacity` bytes; DREQ reads
/// high while at least 32 bytes are free. Each DREQ poll that reads low lets
/// the chip decode `decode_per_poll` bytes, so busy-waits always terminate.
#[derive(Clone)]
pub struct SimulatedChip {
    state: Rc<RefCell<ChipState>>,
}

/// [`CodecLink`] wired to a [`SimulatedChip`].
pub type SimLink = CodecLink<SimBus, SimSelect, SimSelect, SimSelect, SimReady>;

impl SimulatedChip {
    /// Chip with an unbounded FIFO: DREQ is always high.
    pub fn new() -> Self {
        Self {
            state: Rc::new(RefCell::new(ChipState::new(None, SDI_CHUNK))),
        }
    }

    /// Chip with a `capacity`-byte FIFO.
    pub fn with_capacity(capacity: usize, decode_per_poll: usize) -> Self {
        Self {
            state: Rc::new(RefCell::new(ChipState::new(
                Some(capacity),
                decode_per_poll,
            ))),
        }
    }

    /// Bus handle.
    pub fn bus(&self) -> SimBus {
        SimBus {
            state: Rc::clone(&self.state),
        }
    }

    /// Control select line (XCS).
    pub fn xcs(&self) -> SimSelect {
        self.select_line(LINE_CONTROL)
    }

    /// Data select line (XDCS).
    pub fn xdcs(&self) -> SimSelect {
        self.select_line(LINE_DATA)
    }

    /// Storage select line (SDCS).
    pub fn sdcs(&self) -> SimSelect {
        self.select_line(LINE_STORAGE)
    }

    fn select_line(&self, line: usize) -> SimSelect {
        SimSelect {
            state: Rc::clone(&self.state),
            line,
        }
    }

    /// Ready line (DREQ).
    pub fn dreq(&self) -> SimReady {
        SimReady {
            state: Rc::clone(&self.state),
        }
    }

    /// A link over fresh handles to this chip.
    #[allow(clippy::expect_used)] // simulated pins and bus are infallible
    pub fn link(&self) -> SimLink {
        CodecLink::new(self.bus(), self.xcs(), self.xdcs(), self.sdcs(), self.dreq())
            .expect("simulated link cannot fail")
    }

    /// Current value of `reg`.
    pub fn register(&self, reg: Register) -> u16 {
        self.state.borrow().registers[usize::from(reg.addr())]
    }

    /// Preload `reg` with `value`.
    pub fn set_register(&self, reg: Register, value: u16) {
        self.state.borrow_mut().registers[usize::from(reg.addr())] = value;
    }

    /// Every byte received on the data interface so far.
    pub fn data(&self) -> Vec<u8> {
        self.state.borrow().data.clone()
    }

    /// Forget received data bytes.
    pub fn clear_data(&self) {
        self.state.borrow_mut().data.clear();
    }

    /// Bytes clocked while only the storage line was selected.
    pub fn storage_bytes(&self) -> usize {
        self.state.borrow().storage_bytes
    }

    /// Number of select lines currently low.
    pub fn selected_lines(&self) -> usize {
        self.state.borrow().asserted()
    }

    /// Violations recorded so far.
    pub fn violations(&self) -> Violations {
        self.state.borrow().violations
    }

    /// Mark `n` FIFO bytes as occupied.
    pub fn fill_fifo(&self, n: usize) {
        let mut state = self.state.borrow_mut();
        if let Some(cap) = state.capacity {
            state.fill = n.min(cap);
        }
    }

    /// Free FIFO bytes (`usize::MAX` when unbounded).
    pub fn fifo_free(&self) -> usize {
        self.state.borrow().free()
    }

    /// Let the chip decode everything buffered.
    pub fn drain_fifo(&self) {
        self.state.borrow_mut().fill = 0;
    }

    /// Whether the DREQ trigger is armed.
    pub fn trigger_armed(&self) -> bool {
        self.state.borrow().armed
    }

    /// Times the trigger was armed.
    pub fn arm_count(&self) -> usize {
        self.state.borrow().arm_count
    }

    /// Times the trigger was disarmed.
    pub fn disarm_count(&self) -> usize {
        self.state.borrow().disarm_count
    }
}

impl Default for SimulatedChip {
    fn default() -> Self {
        Self::new()
    }
}

/// Simulated SPI bus.
pub struct SimBus {
    state: Rc<RefCell<ChipState>>,
}

impl spi::ErrorType for SimBus {
    type Error = Infallible;
}

impl SpiBus<u8> for SimBus {
    fn read(&mut self, words: &mut [u8]) -> Result<(), Self::Error> {
        let mut state = self.state.borrow_mut();
        for word in words {
            *word = state.clock(0xFF);
        }
        Ok(())
    }

    fn write(&mut self, words: &[u8]) -> Result<(), Self::Error> {
        let mut state = self.state.borrow_mut();
        for &word in words {
            state.clock(word);
        }
        Ok(())
    }

    fn transfer(&mut self, read: &mut [u8], write: &[u8]) -> Result<(), Self::Error> {
        let mut state = self.state.borrow_mut();
        let len = read.len().max(write.len());
        for i in 0..len {
            let out = write.get(i).copied().unwrap_or(0xFF);
            let inp = state.clock(out);
            if let Some(slot) = read.get_mut(i) {
                *slot = inp;
            }
        }
        Ok(())
    }

    fn transfer_in_place(&mut self, words: &mut [u8]) -> Result<(), Self::Error> {
        let mut state = self.state.borrow_mut();
        for word in words {
            *word = state.clock(*word);
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// Simulated active-low select line.
pub struct SimSelect {
    state: Rc<RefCell<ChipState>>,
    line: usize,
}

impl digital::ErrorType for SimSelect {
    type Error = Infallible;
}

impl OutputPin for SimSelect {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        let mut state = self.state.borrow_mut();
        if state.lines[self.line] {
            return Ok(());
        }
        if state.asserted() > 0 {
            state.violations.overlapping_selects += 1;
        }
        state.lines[self.line] = true;
        if self.line == LINE_CONTROL {
            state.frame.clear();
        }
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.state.borrow_mut().lines[self.line] = false;
        Ok(())
    }
}

/// Simulated DREQ line with edge-trigger control.
pub struct SimReady {
    state: Rc<RefCell<ChipState>>,
}

impl digital::ErrorType for SimReady {
    type Error = Infallible;
}

impl InputPin for SimReady {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(self.state.borrow_mut().poll_ready())
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Ok(!self.state.borrow_mut().poll_ready())
    }
}

impl InterruptPin for SimReady {
    fn enable_interrupt(&mut self) -> Result<(), Self::Error> {
        let mut state = self.state.borrow_mut();
        state.armed = true;
        state.arm_count += 1;
        Ok(())
    }

    fn disable_interrupt(&mut self) -> Result<(), Self::Error> {
        let mut state = self.state.borrow_mut();
        state.armed = false;
        state.disarm_count += 1;
        Ok(())
    }

    fn interrupt_enabled(&self) -> bool {
        self.state.borrow().armed
    }
}

// ── In-memory storage ────────────────────────────────────────────────────────

/// Error type for [`MemoryStorage`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum MemoryStorageError {
    /// No file with that name.
    #[error("file not found")]
    NotFound,
    /// Seek beyond end of file.
    #[error("seek past end of file")]
    InvalidSeek,
    /// Injected read failure.
    #[error("read failed")]
    ReadFailed,
}

/// In-memory storage holding named files in insertion order.
#[derive(Default)]
pub struct MemoryStorage {
    files: Vec<(String, Rc<[u8]>)>,
    read_limit: Option<usize>,
    fail_from: Option<usize>,
}

impl MemoryStorage {
    /// Empty storage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Cap every single read at `limit` bytes to exercise short reads.
    #[must_use]
    pub fn with_read_limit(mut self, limit: usize) -> Self {
        self.read_limit = Some(limit.max(1));
        self
    }

    /// Fail every read that starts at or past byte `offset` of any file.
    #[must_use]
    pub fn with_failing_reads_from(mut self, offset: usize) -> Self {
        self.fail_from = Some(offset);
        self
    }

    /// Add or replace a file.
    pub fn insert(&mut self, name: &str, bytes: &[u8]) {
        let data: Rc<[u8]> = Rc::from(bytes);
        if let Some(slot) = self.files.iter_mut().find(|(n, _)| n == name) {
            slot.1 = data;
        } else {
            self.files.push((String::from(name), data));
        }
    }

    /// Builder form of [`MemoryStorage::insert`].
    #[must_use]
    pub fn with_file(mut self, name: &str, bytes: &[u8]) -> Self {
        self.insert(name, bytes);
        self
    }

    /// Number of file handles currently open.
    pub fn open_handles(&self) -> usize {
        self.files
            .iter()
            .map(|(_, data)| Rc::strong_count(data) - 1)
            .sum()
    }
}

/// Open handle into a [`MemoryStorage`] file.
pub struct MemoryFile {
    data: Rc<[u8]>,
    position: usize,
    read_limit: Option<usize>,
    fail_from: Option<usize>,
}

impl File for MemoryFile {
    type Error = MemoryStorageError;

    async fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        if self.fail_from.is_some_and(|at| self.position >= at) {
            return Err(MemoryStorageError::ReadFailed);
        }
        let rest = self.data.get(self.position..).unwrap_or_default();
        let mut n = buf.len().min(rest.len());
        if let Some(limit) = self.read_limit {
            n = n.min(limit);
        }
        if let (Some(dst), Some(src)) = (buf.get_mut(..n), rest.get(..n)) {
            dst.copy_from_slice(src);
        }
        self.position += n;
        Ok(n)
    }

    async fn seek(&mut self, pos: u64) -> Result<u64, Self::Error> {
        let pos = usize::try_from(pos).map_err(|_| MemoryStorageError::InvalidSeek)?;
        if pos > self.data.len() {
            return Err(MemoryStorageError::InvalidSeek);
        }
        self.position = pos;
        Ok(pos as u64)
    }

    fn position(&self) -> u64 {
        self.position as u64
    }

    fn size(&self) -> u64 {
        self.data.len() as u64
    }
}

impl Storage for MemoryStorage {
    type Error = MemoryStorageError;
    type File = MemoryFile;

    async fn open_file(&mut self, path: &str) -> Result<Self::File, Self::Error> {
        let path = path.trim_start_matches('/');
        self.files
            .iter()
            .find(|(name, _)| name == path)
            .map(|(_, data)| MemoryFile {
                data: Rc::clone(data),
                position: 0,
                read_limit: self.read_limit,
                fail_from: self.fail_from,
            })
            .ok_or(MemoryStorageError::NotFound)
    }

    async fn exists(&mut self, path: &str) -> Result<bool, Self::Error> {
        let path = path.trim_start_matches('/');
        Ok(self.files.iter().any(|(name, _)| name == path))
    }

    async fn read_dir(&mut self, dir: &str, visit: &mut dyn FnMut(&str)) -> Result<(), Self::Error> {
        let dir = dir.trim_matches('/');
        for (name, _) in &self.files {
            let rest = if dir.is_empty() {
                Some(name.as_str())
            } else {
                name.strip_prefix(dir).and_then(|r| r.strip_prefix('/'))
            };
            if let Some(entry) = rest.filter(|r| !r.contains('/')) {
                visit(entry);
            }
        }
        Ok(())
    }
}

// ── Delay ────────────────────────────────────────────────────────────────────

/// Delay that returns immediately, recording the total requested time.
#[derive(Debug, Default)]
pub struct NoopDelay {
    elapsed_ns: u64,
}

impl NoopDelay {
    /// New delay with nothing recorded.
    pub fn new() -> Self {
        Self::default()
    }

    /// Total requested delay in milliseconds.
    pub fn elapsed_ms(&self) -> u64 {
        self.elapsed_ns / 1_000_000
    }
}

impl DelayNs for NoopDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.elapsed_ns += u64::from(ns);
    }
}
