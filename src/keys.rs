//! Reading one logical key at a time.
//!
//! Two readers exist. [`ConsoleKeys`] goes through crossterm's event
//! reader. [`ByteKeys`] decodes raw bytes itself, resolving arrow-key
//! escape sequences from whatever the terminal delivered in one read.
//!
//! A lone `ESC` cannot be told apart from the start of a sequence whose
//! remaining bytes arrive in a later read. Such a split sequence decodes as
//! `Escape` followed by the leftover bytes. Complete `ESC [` and `ESC O`
//! sequences other than the plain arrows decode as a single `Unknown`; a
//! byte after an `ESC` that starts neither is dropped.

use std::collections::VecDeque;
use std::fs::File;
use std::io::{self, Read};

use crate::error::{MenuError, MenuResult};

/// One logical key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyEvent {
    Char(char),
    Enter,
    Escape,
    Backspace,
    Tab,
    Up,
    Down,
    CtrlC,
    /// Anything else. Ignored by the menu.
    Unknown,
}

/// Blocking source of key events.
pub trait KeyReader {
    /// Block until one key is available.
    fn read_key(&mut self) -> io::Result<KeyEvent>;
}

/// Which [`KeyReader`] to construct.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum KeyBackend {
    /// Pick by platform: raw bytes on unix, console events elsewhere.
    #[default]
    Auto,
    /// crossterm's event reader.
    Console,
    /// Raw bytes from the controlling terminal.
    Bytes,
}

impl KeyBackend {
    /// Resolve `Auto` for the running platform.
    pub fn resolve(self) -> Self {
        match self {
            KeyBackend::Auto if std::env::consts::FAMILY == "unix" => KeyBackend::Bytes,
            KeyBackend::Auto => KeyBackend::Console,
            other => other,
        }
    }

    /// Construct the reader.
    pub fn open(self) -> MenuResult<Box<dyn KeyReader>> {
        let backend = self.resolve();
        tracing::debug!(?backend, "opening key reader");
        match backend {
            KeyBackend::Bytes => {
                let tty = File::open("/dev/tty")
                    .map_err(|e| MenuError::terminal("failed to open /dev/tty", e))?;
                Ok(Box::new(ByteKeys::new(tty)))
            }
            KeyBackend::Console | KeyBackend::Auto => Ok(Box::new(ConsoleKeys)),
        }
    }
}

const ESC: u8 = 0x1b;
const CTRL_C: u8 = 0x03;
const BACKSPACE: u8 = 0x08;
const TAB: u8 = 0x09;
const LF: u8 = 0x0a;
const CR: u8 = 0x0d;
const DEL: u8 = 0x7f;

/// Decodes keys from a raw byte stream.
#[derive(Debug)]
pub struct ByteKeys<R> {
    input: R,
    pending: VecDeque<u8>,
}

impl<R: Read> ByteKeys<R> {
    pub fn new(input: R) -> Self {
        Self {
            input,
            pending: VecDeque::new(),
        }
    }

    /// Read once from the input if nothing is buffered.
    fn fill(&mut self) -> io::Result<()> {
        if !self.pending.is_empty() {
            return Ok(());
        }
        let mut buf = [0u8; 64];
        let n = loop {
            match self.input.read(&mut buf) {
                Ok(n) => break n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        };
        if n == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "key input closed",
            ));
        }
        self.pending.extend(&buf[..n]);
        Ok(())
    }

    fn decode_escape(&mut self) -> KeyEvent {
        match self.pending.pop_front() {
            None => KeyEvent::Escape,
            Some(b'[') => self.decode_csi(),
            Some(b'O') => match self.pending.pop_front() {
                Some(b'A') => KeyEvent::Up,
                Some(b'B') => KeyEvent::Down,
                _ => KeyEvent::Unknown,
            },
            Some(_) => KeyEvent::Escape,
        }
    }

    /// Consume a whole `ESC [` sequence: parameter and intermediate bytes
    /// up to and including the final byte.
    fn decode_csi(&mut self) -> KeyEvent {
        let mut has_params = false;
        while let Some(&b) = self.pending.front() {
            if !(0x20..=0x3f).contains(&b) {
                break;
            }
            self.pending.pop_front();
            has_params = true;
        }
        let final_byte = match self.pending.front() {
            Some(&b) if (0x40..=0x7e).contains(&b) => {
                self.pending.pop_front();
                b
            }
            _ => return KeyEvent::Unknown,
        };
        match (has_params, final_byte) {
            (false, b'A') => KeyEvent::Up,
            (false, b'B') => KeyEvent::Down,
            _ => KeyEvent::Unknown,
        }
    }

    /// `0xE0`/`0x00` prefixed scan codes as sent by console getch.
    fn decode_scan_code(&mut self) -> KeyEvent {
        match self.pending.pop_front() {
            Some(b'H') => KeyEvent::Up,
            Some(b'P') => KeyEvent::Down,
            _ => KeyEvent::Unknown,
        }
    }

    fn decode_utf8(&mut self, lead: u8) -> KeyEvent {
        let width = match lead {
            0xc2..=0xdf => 2,
            0xe0..=0xef => 3,
            0xf0..=0xf4 => 4,
            _ => return KeyEvent::Unknown,
        };
        let continuation = self
            .pending
            .iter()
            .take(width - 1)
            .take_while(|&&b| (0x80..=0xbf).contains(&b))
            .count();
        if continuation != width - 1 {
            return KeyEvent::Unknown;
        }
        let mut bytes = vec![lead];
        bytes.extend(self.pending.drain(..width - 1));
        match std::str::from_utf8(&bytes).ok().and_then(|s| s.chars().next()) {
            Some(c) if !c.is_control() => KeyEvent::Char(c),
            _ => KeyEvent::Unknown,
        }
    }
}

impl<R: Read> KeyReader for ByteKeys<R> {
    fn read_key(&mut self) -> io::Result<KeyEvent> {
        self.fill()?;
        let Some(byte) = self.pending.pop_front() else {
            return Ok(KeyEvent::Unknown);
        };
        let key = match byte {
            CR | LF => KeyEvent::Enter,
            ESC => self.decode_escape(),
            DEL | BACKSPACE => KeyEvent::Backspace,
            TAB => KeyEvent::Tab,
            CTRL_C => KeyEvent::CtrlC,
            0x20..=0x7e => KeyEvent::Char(byte as char),
            0x00 => self.decode_scan_code(),
            0xe0 if matches!(self.pending.front(), Some(b'H' | b'P' | b'K' | b'M')) => {
                self.decode_scan_code()
            }
            0x80..=0xff => self.decode_utf8(byte),
            _ => KeyEvent::Unknown,
        };
        Ok(key)
    }
}

/// Keys from crossterm's event reader.
#[derive(Debug, Default)]
pub struct ConsoleKeys;

impl KeyReader for ConsoleKeys {
    fn read_key(&mut self) -> io::Result<KeyEvent> {
        Ok(translate_event(crossterm::event::read()?))
    }
}

/// Map a crossterm event onto a [`KeyEvent`].
pub fn translate_event(event: crossterm::event::Event) -> KeyEvent {
    use crossterm::event::{Event, KeyCode, KeyEventKind, KeyModifiers};

    let Event::Key(key) = event else {
        return KeyEvent::Unknown;
    };
    if key.kind != KeyEventKind::Press {
        return KeyEvent::Unknown;
    }
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return match key.code {
            KeyCode::Char('c') | KeyCode::Char('C') => KeyEvent::CtrlC,
            KeyCode::Char('h') => KeyEvent::Backspace,
            _ => KeyEvent::Unknown,
        };
    }
    match key.code {
        KeyCode::Char(c) if !c.is_control() => KeyEvent::Char(c),
        KeyCode::Enter => KeyEvent::Enter,
        KeyCode::Esc => KeyEvent::Escape,
        KeyCode::Backspace => KeyEvent::Backspace,
        KeyCode::Tab => KeyEvent::Tab,
        KeyCode::Up => KeyEvent::Up,
        KeyCode::Down => KeyEvent::Down,
        _ => KeyEvent::Unknown,
    }
}
