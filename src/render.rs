//! Terminal rendering of a lattice as a staggered hexagon mosaic.
//!
//! Everything here is computed fresh from `(position, water)` pairs; nothing
//! is cached on the cells themselves.

use crate::coord::Cube;
use crate::lattice::{Cell, FREEZE_THRESHOLD};
use crossterm::{
    cursor, execute, queue,
    style::{Color, Print, ResetColor, SetForegroundColor},
    terminal::{
        self, BeginSynchronizedUpdate, Clear, ClearType, DisableLineWrap, EnableLineWrap,
        EndSynchronizedUpdate, EnterAlternateScreen, LeaveAlternateScreen,
    },
};
use serde::{Deserialize, Serialize};
use std::io::{self, Stdout, Write};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WaterBand {
    Dry,
    Damp,
    Moist,
    Saturated,
    Ice,
}

impl WaterBand {
    pub const ALL: [WaterBand; 5] = [
        WaterBand::Dry,
        WaterBand::Damp,
        WaterBand::Moist,
        WaterBand::Saturated,
        WaterBand::Ice,
    ];

    pub fn classify(water: f64) -> Self {
        if water < 0.25 {
            WaterBand::Dry
        } else if water < 0.5 {
            WaterBand::Damp
        } else if water < 0.75 {
            WaterBand::Moist
        } else if water < FREEZE_THRESHOLD {
            WaterBand::Saturated
        } else {
            WaterBand::Ice
        }
    }

    pub fn color_name(self) -> &'static str {
        match self {
            WaterBand::Dry => "navy",
            WaterBand::Damp => "royalblue",
            WaterBand::Moist => "deepskyblue",
            WaterBand::Saturated => "lightcyan",
            WaterBand::Ice => "white",
        }
    }

    pub fn rgb(self) -> (u8, u8, u8) {
        match self {
            WaterBand::Dry => (0, 0, 128),
            WaterBand::Damp => (65, 105, 225),
            WaterBand::Moist => (0, 191, 255),
            WaterBand::Saturated => (224, 255, 255),
            WaterBand::Ice => (255, 255, 255),
        }
    }

    pub fn color(self) -> Color {
        let (r, g, b) = self.rgb();
        Color::Rgb { r, g, b }
    }

    /// Glyph density grows with the band so the mosaic reads without color.
    pub fn glyph(self) -> char {
        match self {
            WaterBand::Dry => '·',
            WaterBand::Damp => '◦',
            WaterBand::Moist => '○',
            WaterBand::Saturated => '◉',
            WaterBand::Ice => '⬢',
        }
    }
}

/// Column and row of a cell in the mosaic of a lattice of side `radius`.
///
/// Rows run from `z = radius` at the top down to `z = -radius`; within a row
/// cells are two columns apart, and consecutive rows are staggered by one.
pub fn mosaic_pos(c: Cube, radius: i32) -> (u16, u16) {
    let col = 2 * radius + (c.x() - c.y());
    let row = radius - c.z();
    (col as u16, row as u16)
}

pub struct Mosaic {
    pub w: u16,
    pub h: u16,
    cells: Vec<Option<WaterBand>>,
}

impl Mosaic {
    pub fn build<I>(radius: i32, cells: I) -> Self
    where
        I: IntoIterator<Item = Cell>,
    {
        let r = radius.max(0);
        let w = (4 * r + 1) as u16;
        let h = (2 * r + 1) as u16;
        let mut m = Self {
            w,
            h,
            cells: vec![None; w as usize * h as usize],
        };
        for cell in cells {
            let (x, y) = mosaic_pos(cell.position, r);
            if x < w && y < h {
                let i = m.idx(x, y);
                m.cells[i] = Some(WaterBand::classify(cell.water));
            }
        }
        m
    }

    fn idx(&self, x: u16, y: u16) -> usize {
        y as usize * self.w as usize + x as usize
    }

    pub fn get(&self, x: u16, y: u16) -> Option<WaterBand> {
        if x < self.w && y < self.h {
            self.cells[self.idx(x, y)]
        } else {
            None
        }
    }

    pub fn row(&self, y: u16) -> &[Option<WaterBand>] {
        let start = self.idx(0, y);
        &self.cells[start..start + self.w as usize]
    }

    /// Write the mosaic as plain lines, optionally colored with ANSI escapes.
    pub fn write_to<W: Write>(&self, out: &mut W, color: bool) -> io::Result<()> {
        for y in 0..self.h {
            self.queue_row(out, y, color)?;
            queue!(out, Print('\n'))?;
        }
        out.flush()
    }

    fn queue_row<W: Write>(&self, out: &mut W, y: u16, color: bool) -> io::Result<()> {
        let mut last_fg = None;
        for slot in self.row(y) {
            match slot {
                Some(band) => {
                    if color && last_fg != Some(*band) {
                        queue!(out, SetForegroundColor(band.color()))?;
                        last_fg = Some(*band);
                    }
                    queue!(out, Print(band.glyph()))?;
                }
                None => queue!(out, Print(' '))?,
            }
        }
        if color {
            queue!(out, ResetColor)?;
        }
        Ok(())
    }
}

/// Raw-mode alternate screen, restored on drop.
pub struct TermGuard {
    pub out: Stdout,
}

impl TermGuard {
    pub fn new() -> io::Result<Self> {
        let mut out = io::stdout();
        terminal::enable_raw_mode()?;
        execute!(
            out,
            EnterAlternateScreen,
            DisableLineWrap,
            cursor::Hide,
            Clear(ClearType::All)
        )?;
        Ok(Self { out })
    }

    /// Draw `mosaic` centered below a one-line HUD.
    pub fn draw(&mut self, mosaic: &Mosaic, hud: &str, color: bool) -> io::Result<()> {
        let (cols, rows) = terminal::size()?;
        let x0 = cols.saturating_sub(mosaic.w) / 2;
        let y0 = 1 + rows.saturating_sub(1).saturating_sub(mosaic.h) / 2;

        queue!(self.out, BeginSynchronizedUpdate, cursor::MoveTo(0, 0), ResetColor)?;
        let hud: String = hud.chars().take(cols as usize).collect();
        queue!(self.out, Print(&hud), Clear(ClearType::UntilNewLine))?;

        for y in 0..mosaic.h {
            let sy = y0 + y;
            if sy >= rows {
                break;
            }
            queue!(self.out, cursor::MoveTo(x0, sy))?;
            mosaic.queue_row(&mut self.out, y, color)?;
        }

        queue!(self.out, ResetColor, EndSynchronizedUpdate)?;
        self.out.flush()
    }
}

impl Drop for TermGuard {
    fn drop(&mut self) {
        let _ = execute!(
            self.out,
            EndSynchronizedUpdate,
            ResetColor,
            cursor::Show,
            EnableLineWrap,
            LeaveAlternateScreen
        );
        let _ = terminal::disable_raw_mode();
    }
}
