//! Shared integration-test harness: an in-process fake emulator speaking
//! the RetroArch network command text protocol.

#![allow(dead_code)]

use std::collections::HashMap;
use std::fmt::Write as _;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use retrotrack::decode::MemoryField;
use retrotrack::decode::tables::{STATS_BASE, STATS_LEN, area, stats_offset};
use retrotrack::error::TransportError;
use retrotrack::transport::{MemoryTransport, Result};

/// Status reply of a running Super Metroid session.
pub const PLAYING_STATUS: &str = "GET_STATUS PLAYING super_nes,Super Metroid,crc32=d63ed5f8";

/// Status reply with no content loaded.
pub const CONTENTLESS_STATUS: &str = "GET_STATUS CONTENTLESS";

/// Final fight room id.
pub const FIGHT_ROOM: u16 = 0xDD58;

/// Fake emulator with byte-addressed memory.
///
/// Unset memory reads as zero. Failure switches let tests inject connect
/// errors, silence, and panics.
#[derive(Default)]
pub struct FakeEmulator {
    memory: Mutex<HashMap<u32, u8>>,
    status: Mutex<Option<String>>,
    silent: AtomicBool,
    connected: AtomicBool,
    connect_failures: AtomicUsize,
    panics: AtomicUsize,
    commands: AtomicUsize,
}

impl FakeEmulator {
    /// A responsive emulator running Super Metroid.
    pub fn playing() -> Self {
        let fake = Self::default();
        fake.set_status(Some(PLAYING_STATUS));
        fake
    }

    pub fn set_status(&self, status: Option<&str>) {
        *self.status.lock().unwrap() = status.map(String::from);
    }

    /// Stops answering every command.
    pub fn set_silent(&self, silent: bool) {
        self.silent.store(silent, Ordering::SeqCst);
    }

    /// Fails the next `count` connect attempts.
    pub fn fail_connects(&self, count: usize) {
        self.connected.store(false, Ordering::SeqCst);
        self.connect_failures.store(count, Ordering::SeqCst);
    }

    /// Panics inside the next `count` commands.
    pub fn panic_next(&self, count: usize) {
        self.panics.store(count, Ordering::SeqCst);
    }

    pub fn commands_seen(&self) -> usize {
        self.commands.load(Ordering::SeqCst)
    }

    pub fn write_bytes(&self, address: u32, bytes: &[u8]) {
        let mut memory = self.memory.lock().unwrap();
        for (i, b) in bytes.iter().enumerate() {
            memory.insert(address + u32::try_from(i).unwrap(), *b);
        }
    }

    /// Copy of the bulk stats block.
    pub fn stats_block(&self) -> Vec<u8> {
        let memory = self.memory.lock().unwrap();
        (0..STATS_LEN)
            .map(|i| {
                memory
                    .get(&(STATS_BASE + u32::try_from(i).unwrap()))
                    .copied()
                    .unwrap_or(0)
            })
            .collect()
    }

    /// Replaces the bulk stats block in one step.
    pub fn write_stats_block(&self, block: &[u8]) {
        self.write_bytes(STATS_BASE, block);
    }

    pub fn write_word(&self, address: u32, value: u16) {
        self.write_bytes(address, &value.to_le_bytes());
    }

    /// Writes a word inside the bulk stats block.
    pub fn write_stat(&self, offset: usize, value: u16) {
        self.write_word(STATS_BASE + u32::try_from(offset).unwrap(), value);
    }

    pub fn write_field(&self, field: MemoryField, value: u16) {
        if field.length() == 1 {
            self.write_bytes(field.address(), &[u8::try_from(value).unwrap()]);
        } else {
            self.write_word(field.address(), value);
        }
    }

    /// Lays out a mid-game save: some resources spent, location in Brinstar.
    pub fn load_mid_game(&self) {
        self.write_stat(stats_offset::HEALTH, 450);
        self.write_stat(stats_offset::MAX_HEALTH, 599);
        self.write_stat(stats_offset::MISSILES, 40);
        self.write_stat(stats_offset::MAX_MISSILES, 60);
        self.write_stat(stats_offset::SUPERS, 5);
        self.write_stat(stats_offset::MAX_SUPERS, 10);
        self.write_stat(stats_offset::ITEMS, 0x1005);
        self.write_stat(stats_offset::BEAMS, 0x1001);
        self.write_field(MemoryField::Area, u16::from(area::BRINSTAR));
        self.write_field(MemoryField::Room, 0x9AD9);
        self.write_field(MemoryField::GameState, 0x0008);
    }

    /// Places the avatar in the final fight room with the given missiles
    /// left out of 135 and health 700/999.
    pub fn enter_fight_room(&self, missiles: u16) {
        self.write_stat(stats_offset::HEALTH, 700);
        self.write_stat(stats_offset::MAX_HEALTH, 999);
        self.write_stat(stats_offset::MISSILES, missiles);
        self.write_stat(stats_offset::MAX_MISSILES, 135);
        self.write_field(MemoryField::Area, u16::from(area::TOURIAN));
        self.write_field(MemoryField::Room, FIGHT_ROOM);
        self.write_field(MemoryField::PosX, 0x0200);
        self.write_field(MemoryField::GameState, 0x0008);
    }

    fn read(&self, address: u32, length: usize) -> String {
        let memory = self.memory.lock().unwrap();
        let mut reply = format!("READ_CORE_MEMORY {address:x}");
        for i in 0..length {
            let byte = memory
                .get(&(address + u32::try_from(i).unwrap()))
                .copied()
                .unwrap_or(0);
            let _ = write!(reply, " {byte:02x}");
        }
        reply
    }
}

#[async_trait::async_trait]
impl MemoryTransport for FakeEmulator {
    async fn connect(&self) -> Result<()> {
        if self
            .connect_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            return Err(TransportError::ConnectionFailed("refused".to_string()));
        }
        self.connected.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    async fn send_command(&self, command: &str) -> Option<String> {
        self.commands.fetch_add(1, Ordering::SeqCst);
        if self
            .panics
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            panic!("emulator exploded");
        }
        if self.silent.load(Ordering::SeqCst) {
            return None;
        }

        let mut parts = command.split_whitespace();
        match parts.next()? {
            "VERSION" => Some("1.19.1".to_string()),
            "GET_STATUS" => self.status.lock().unwrap().clone(),
            "READ_CORE_MEMORY" => {
                let address = u32::from_str_radix(parts.next()?.trim_start_matches("0x"), 16).ok()?;
                let length = parts.next()?.parse().ok()?;
                Some(self.read(address, length))
            }
            _ => None,
        }
    }
}
