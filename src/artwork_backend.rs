//! Crossterm backend that draws kitty images on top of each frame
//!
//! Rendering code records placements in a shared registry; after ratatui has
//! flushed the cell diff, the backend writes the image sequences at their
//! positions and deletes images that are no longer placed.

use std::collections::HashSet;
use std::io::{self, Write};
use std::sync::{Arc, Mutex, OnceLock};

use crossterm::{cursor::MoveTo, queue, style::Print};
use ratatui::backend::{Backend, ClearType, CrosstermBackend, WindowSize};
use ratatui::buffer::Cell;
use ratatui::layout::{Position, Size};

/// One image drawn with its top-left corner at `(x, y)`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Placement {
    pub id: u32,
    pub x: u16,
    pub y: u16,
    pub sequence: String,
}

#[derive(Default, Debug)]
pub struct PlacementRegistry {
    placements: Vec<Placement>,
}

impl PlacementRegistry {
    /// Replaces an earlier placement with the same id.
    pub fn place(&mut self, placement: Placement) {
        self.placements.retain(|p| p.id != placement.id);
        self.placements.push(placement);
    }

    pub fn clear(&mut self) {
        self.placements.clear();
    }

    pub fn placements(&self) -> &[Placement] {
        &self.placements
    }
}

static REGISTRY: OnceLock<Arc<Mutex<PlacementRegistry>>> = OnceLock::new();

pub fn registry() -> Arc<Mutex<PlacementRegistry>> {
    REGISTRY
        .get_or_init(|| Arc::new(Mutex::new(PlacementRegistry::default())))
        .clone()
}

pub fn place(placement: Placement) {
    if let Ok(mut registry) = registry().lock() {
        registry.place(placement);
    }
}

pub fn clear() {
    if let Ok(mut registry) = registry().lock() {
        registry.clear();
    }
}

fn delete_sequence(id: u32) -> String {
    format!("\x1b_Ga=d,d=i,i={id},q=2\x1b\\")
}

pub struct ArtworkBackend<W: Write> {
    inner: CrosstermBackend<W>,
    registry: Arc<Mutex<PlacementRegistry>>,
    shown: HashSet<u32>,
}

impl<W: Write> ArtworkBackend<W> {
    pub fn new(writer: W, registry: Arc<Mutex<PlacementRegistry>>) -> Self {
        Self {
            inner: CrosstermBackend::new(writer),
            registry,
            shown: HashSet::new(),
        }
    }

    fn draw_placements(&mut self) -> io::Result<()> {
        let placements = match self.registry.lock() {
            Ok(registry) => registry.placements().to_vec(),
            Err(_) => return Ok(()),
        };
        let current: HashSet<u32> = placements.iter().map(|p| p.id).collect();
        for id in self.shown.difference(&current) {
            queue!(self.inner, Print(delete_sequence(*id)))?;
        }
        // Re-sending an id replaces the earlier image, so moved art needs no delete.
        for placement in &placements {
            queue!(
                self.inner,
                MoveTo(placement.x, placement.y),
                Print(&placement.sequence)
            )?;
        }
        self.shown = current;
        Ok(())
    }
}

impl<W: Write> Backend for ArtworkBackend<W> {
    fn draw<'a, I>(&mut self, content: I) -> io::Result<()>
    where
        I: Iterator<Item = (u16, u16, &'a Cell)>,
    {
        self.inner.draw(content)?;
        self.draw_placements()
    }

    fn append_lines(&mut self, n: u16) -> io::Result<()> {
        self.inner.append_lines(n)
    }

    fn hide_cursor(&mut self) -> io::Result<()> {
        self.inner.hide_cursor()
    }

    fn show_cursor(&mut self) -> io::Result<()> {
        self.inner.show_cursor()
    }

    fn get_cursor_position(&mut self) -> io::Result<Position> {
        self.inner.get_cursor_position()
    }

    fn set_cursor_position<P: Into<Position>>(&mut self, position: P) -> io::Result<()> {
        self.inner.set_cursor_position(position)
    }

    fn clear(&mut self) -> io::Result<()> {
        self.inner.clear()
    }

    fn clear_region(&mut self, clear_type: ClearType) -> io::Result<()> {
        self.inner.clear_region(clear_type)
    }

    fn size(&self) -> io::Result<Size> {
        self.inner.size()
    }

    fn window_size(&mut self) -> io::Result<WindowSize> {
        self.inner.window_size()
    }

    fn flush(&mut self) -> io::Result<()> {
        Backend::flush(&mut self.inner)
    }
}

impl<W: Write> Write for ArtworkBackend<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        Write::flush(&mut self.inner)
    }
}
