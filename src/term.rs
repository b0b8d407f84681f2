use crate::{Coords, TermInt};
use std::{io::{Stdout, Write, stdout}, time::Duration};

use anyhow::{bail, Context, Result};
use crossterm::{cursor, execute, queue, style, terminal};
use crossterm::event::{Event, KeyEvent, KeyEventKind, poll, read};
use crossterm::style::{Attribute, Color};
use crossterm::terminal::{ClearType, EnterAlternateScreen, LeaveAlternateScreen};
use log::{debug, warn};

/// Character grid the game is laid out for.
pub const SCREEN_COLS: TermInt = 47;
pub const SCREEN_ROWS: TermInt = 25;

const BORDER_CHAR: char = '█';

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Attr {
    Normal,
    Reverse,
    Body,
    Head,
    Fruit,
}

/// A rectangular window on the screen. Positions passed to the drawing
/// calls are (row, col) relative to its top-left corner.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Surface {
    height: TermInt,
    width: TermInt,
    top: TermInt,
    left: TermInt,
}

impl Surface {
    pub fn new(height: TermInt, width: TermInt, top: TermInt, left: TermInt) -> Self {
        Surface { height, width, top, left }
    }

    /// (height, width, top, left)
    pub fn bounds(&self) -> (TermInt, TermInt, TermInt, TermInt) {
        (self.height, self.width, self.top, self.left)
    }

    /// Maps a surface-relative position to absolute (row, col) screen
    /// coordinates, or `None` if it falls outside the surface.
    pub fn to_screen(&self, pos: Coords) -> Option<(TermInt, TermInt)> {
        let (row, col) = pos;
        if row < 0 || col < 0 || row as TermInt >= self.height || col as TermInt >= self.width {
            return None;
        }

        Some((self.top + row as TermInt, self.left + col as TermInt))
    }
}

/// In-memory copy of what has been drawn, so cells can be read back and
/// restored after a modal is taken down.
pub struct ScreenBuffer {
    width: TermInt,
    height: TermInt,
    cells: Vec<(char, Attr)>,
}

impl ScreenBuffer {
    pub fn new(width: TermInt, height: TermInt) -> Self {
        ScreenBuffer { width, height, cells: vec![(' ', Attr::Normal); width as usize * height as usize] }
    }

    pub fn get(&self, row: TermInt, col: TermInt) -> Option<(char, Attr)> {
        self.index(row, col).map(|i| self.cells[i])
    }

    pub fn set(&mut self, row: TermInt, col: TermInt, cell: (char, Attr)) -> bool {
        match self.index(row, col) {
            Some(i) => {
                self.cells[i] = cell;
                true
            },
            None => false,
        }
    }

    pub fn clear(&mut self) {
        for cell in self.cells.iter_mut() {
            *cell = (' ', Attr::Normal);
        }
    }

    fn index(&self, row: TermInt, col: TermInt) -> Option<usize> {
        if row < self.height && col < self.width {
            Some(self.width as usize * row as usize + col as usize)
        } else {
            None
        }
    }
}

pub struct TermManager {
    stdout: Stdout,
    screen: ScreenBuffer,
    prior_size: (TermInt, TermInt),
    current_msg: Option<Surface>,
}

impl TermManager {
    pub fn new() -> Result<Self> {
        let (cols, rows) = terminal::size().context("reading terminal size")?;
        Ok(TermManager {
            stdout: stdout(),
            screen: ScreenBuffer::new(SCREEN_COLS, SCREEN_ROWS),
            prior_size: (cols, rows),
            current_msg: None,
        })
    }

    pub fn setup(&mut self) -> Result<()> {
        execute!(self.stdout, EnterAlternateScreen).context("entering alternate screen")?;
        // Not every terminal honours a resize request, so check what we got
        execute!(self.stdout, terminal::SetSize(SCREEN_COLS, SCREEN_ROWS)).context("resizing terminal")?;
        terminal::enable_raw_mode().context("enabling raw mode")?;
        execute!(self.stdout, cursor::Hide, cursor::DisableBlinking).context("hiding cursor")?;

        let (cols, rows) = terminal::size().context("reading terminal size")?;
        if cols < SCREEN_COLS || rows < SCREEN_ROWS {
            bail!("terminal is {}x{}, need at least {}x{}", cols, rows, SCREEN_COLS, SCREEN_ROWS);
        }

        debug!("terminal ready at {}x{}", cols, rows);
        self.clear()
    }

    /// Puts the terminal back the way `new` found it. Every step is attempted
    /// even if an earlier one fails; the first error is returned.
    pub fn restore(&mut self) -> Result<()> {
        let (cols, rows) = self.prior_size;
        let steps = [
            terminal::disable_raw_mode(),
            execute!(self.stdout, style::SetAttribute(Attribute::Reset), cursor::Show, cursor::EnableBlinking),
            execute!(self.stdout, terminal::SetSize(cols, rows)),
            execute!(self.stdout, LeaveAlternateScreen),
        ];

        let mut first_err = None;
        for res in steps {
            if let Err(e) = res {
                warn!("restoring terminal: {}", e);
                first_err.get_or_insert(e);
            }
        }

        match first_err {
            Some(e) => Err(e).context("restoring terminal"),
            None => Ok(()),
        }
    }

    pub fn read_key_blocking(&self) -> Result<KeyEvent> {
        loop {
            if let Event::Key(ev) = read()? {
                if ev.kind != KeyEventKind::Release {
                    return Ok(ev);
                }
            }
        }
    }

    /// Returns the next pending key press without waiting for one.
    pub fn poll_key(&self) -> Result<Option<KeyEvent>> {
        while poll(Duration::ZERO)? {
            if let Event::Key(ev) = read()? {
                if ev.kind != KeyEventKind::Release {
                    return Ok(Some(ev));
                }
            }
        }

        Ok(None)
    }

    /// Opens a blank window. Fails if it doesn't fit on the screen.
    pub fn new_surface(&mut self, height: TermInt, width: TermInt, top: TermInt, left: TermInt) -> Result<Surface> {
        if top + height > SCREEN_ROWS || left + width > SCREEN_COLS {
            bail!("surface {}x{} at ({}, {}) does not fit the screen", height, width, top, left);
        }

        let surface = Surface::new(height, width, top, left);
        for row in 0..height as i16 {
            for col in 0..width as i16 {
                self.write_cell(&surface, (row, col), ' ', Attr::Normal)?;
            }
        }

        Ok(surface)
    }

    pub fn draw_border(&mut self, surface: &Surface) -> Result<()> {
        let (height, width, _, _) = surface.bounds();
        let (end_row, end_col) = (height as i16 - 1, width as i16 - 1);

        for col in 0..=end_col {
            self.write_cell(surface, (0, col), BORDER_CHAR, Attr::Normal)?;
            self.write_cell(surface, (end_row, col), BORDER_CHAR, Attr::Normal)?;
        }

        for row in 1..end_row {
            self.write_cell(surface, (row, 0), BORDER_CHAR, Attr::Normal)?;
            self.write_cell(surface, (row, end_col), BORDER_CHAR, Attr::Normal)?;
        }

        Ok(())
    }

    pub fn write_cell(&mut self, surface: &Surface, pos: Coords, ch: char, attr: Attr) -> Result<()> {
        match surface.to_screen(pos) {
            Some((row, col)) => {
                self.queue_cell(row, col, ch, attr)?;
                self.screen.set(row, col, (ch, attr));
            },
            None => debug!("dropping write outside surface at {:?}", pos),
        }

        Ok(())
    }

    pub fn read_cell(&self, surface: &Surface, pos: Coords) -> Option<(char, Attr)> {
        surface.to_screen(pos).and_then(|(row, col)| self.screen.get(row, col))
    }

    pub fn write_str(&mut self, surface: &Surface, pos: Coords, text: &str, attr: Attr) -> Result<()> {
        for (i, ch) in text.chars().enumerate() {
            self.write_cell(surface, (pos.0, pos.1 + i as i16), ch, attr)?;
        }

        Ok(())
    }

    /// Draws a bordered box with centered lines on top of whatever is on
    /// screen, without recording it in the buffer so `hide_message` can put
    /// the old content back.
    pub fn show_message(&mut self, surface: Surface, lines: &[(&str, Attr)]) -> Result<()> {
        if self.has_message() {
            self.hide_message()?;
        }

        let (height, width, top, left) = surface.bounds();
        let first_line = (height as usize).saturating_sub((lines.len() * 2).saturating_sub(1)) / 2;

        for row in 0..height {
            for col in 0..width {
                let edge = row == 0 || col == 0 || row == height - 1 || col == width - 1;
                let ch = if edge { BORDER_CHAR } else { ' ' };
                self.queue_cell(top + row, left + col, ch, Attr::Normal)?;
            }
        }

        for (i, (line, attr)) in lines.iter().enumerate() {
            let row = top + (first_line + i * 2) as TermInt;
            let col = left + (width.saturating_sub(line.chars().count() as TermInt)) / 2;
            for (x_diff, ch) in line.chars().enumerate() {
                self.queue_cell(row, col + x_diff as TermInt, ch, *attr)?;
            }
        }

        self.current_msg = Some(surface);
        self.refresh()
    }

    pub fn hide_message(&mut self) -> Result<()> {
        let msg = match self.current_msg.take() {
            Some(msg) => msg,
            None => return Ok(()),
        };

        let (height, width, _, _) = msg.bounds();
        for row in 0..height as i16 {
            for col in 0..width as i16 {
                if let (Some((r, c)), Some((ch, attr))) = (msg.to_screen((row, col)), self.read_cell(&msg, (row, col))) {
                    self.queue_cell(r, c, ch, attr)?;
                }
            }
        }

        self.refresh()
    }

    pub fn has_message(&self) -> bool {
        self.current_msg.is_some()
    }

    pub fn clear(&mut self) -> Result<()> {
        self.current_msg = None;
        self.screen.clear();
        execute!(self.stdout, style::SetAttribute(Attribute::Reset), terminal::Clear(ClearType::All))?;
        Ok(())
    }

    pub fn refresh(&mut self) -> Result<()> {
        self.stdout.flush()?;
        Ok(())
    }

    ///////////////////////////////////////////////////////////////////////////

    fn queue_cell(&mut self, row: TermInt, col: TermInt, ch: char, attr: Attr) -> Result<()> {
        queue!(self.stdout, cursor::MoveTo(col, row), style::SetAttribute(Attribute::Reset))?;

        match attr {
            Attr::Normal => {},
            Attr::Reverse => queue!(self.stdout, style::SetAttribute(Attribute::Reverse))?,
            Attr::Body => queue!(self.stdout,
                style::SetForegroundColor(Color::Black),
                style::SetBackgroundColor(Color::Green))?,
            Attr::Head => queue!(self.stdout,
                style::SetForegroundColor(Color::Black),
                style::SetBackgroundColor(Color::Green),
                style::SetAttribute(Attribute::SlowBlink))?,
            Attr::Fruit => queue!(self.stdout,
                style::SetForegroundColor(Color::Black),
                style::SetBackgroundColor(Color::Red),
                style::SetAttribute(Attribute::SlowBlink))?,
        }

        queue!(self.stdout, style::Print(ch))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn surface_translates_to_screen() {
        let surface = Surface::new(23, 45, 1, 1);

        assert_eq!(surface.to_screen((0, 0)), Some((1, 1)));
        assert_eq!(surface.to_screen((22, 44)), Some((23, 45)));
        assert_eq!(surface.to_screen((23, 0)), None);
        assert_eq!(surface.to_screen((0, -1)), None);
    }

    #[test]
    fn buffer_reads_back_writes() {
        let mut buf = ScreenBuffer::new(SCREEN_COLS, SCREEN_ROWS);

        assert_eq!(buf.get(3, 4), Some((' ', Attr::Normal)));
        assert!(buf.set(3, 4, (':', Attr::Body)));
        assert_eq!(buf.get(3, 4), Some((':', Attr::Body)));

        assert!(!buf.set(SCREEN_ROWS, 0, ('x', Attr::Normal)));
        assert_eq!(buf.get(0, SCREEN_COLS), None);

        buf.clear();
        assert_eq!(buf.get(3, 4), Some((' ', Attr::Normal)));
    }
}
