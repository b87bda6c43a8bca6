/// Rendering layer: all terminal I/O lives here.
///
/// The game runs in a fixed virtual world (800×600 by default); every draw
/// call maps world coordinates onto the terminal grid through a `Viewport`
/// built from the current terminal size.  No game logic is performed here.

use std::io::Write;

use crossterm::{
    cursor,
    style::{self, Attribute, Color, Print},
    terminal,
    QueueableCommand,
};
use keyblaster::entities::{Explosion, ExplosionKind, GameStatus, Missile, Point, Powerup};
use keyblaster::name_input::NameInput;
use keyblaster::scores::{format_row, group_thousands, ScoreEntry};
use keyblaster::session::GameSession;
use keyblaster::turret::BARREL_LENGTH;

// ── Colour palette ────────────────────────────────────────────────────────────

const C_HUD_SCORE: Color = Color::Yellow;
const C_HUD_LEVEL: Color = Color::Cyan;
const C_HUD_BUFFER: Color = Color::White;
const C_GROUND: Color = Color::DarkGreen;
const C_CITY: Color = Color::Blue;
const C_TURRET: Color = Color::Grey;
const C_TURRET_POWERED: Color = Color::Yellow;
const C_TRAIL: Color = Color::DarkRed;
const C_WARHEAD: Color = Color::Red;
const C_LABEL: Color = Color::White;
const C_TYPED: Color = Color::Green;
const C_LASER: Color = Color::Red;
const C_LASER_FADED: Color = Color::DarkRed;
const C_HINT: Color = Color::DarkGrey;

/// Trail dots drawn behind each warhead.
const TRAIL_STEPS: usize = 24;

// ── World → terminal mapping ──────────────────────────────────────────────────

/// Row 0 is the HUD and the last row the controls hint; the world fills
/// everything in between.
#[derive(Clone, Copy, Debug)]
struct Viewport {
    cols: u16,
    rows: u16,
    world_w: f32,
    world_h: f32,
}

impl Viewport {
    fn new(cols: u16, rows: u16, world_w: f32, world_h: f32) -> Self {
        Self {
            cols: cols.max(1),
            rows: rows.max(3),
            world_w: world_w.max(1.0),
            world_h: world_h.max(1.0),
        }
    }

    fn field_rows(&self) -> u16 {
        self.rows - 2
    }

    /// Terminal cell for a world point, `None` when off-screen.
    fn cell(&self, p: Point) -> Option<(u16, u16)> {
        if p.x < 0.0 || p.y < 0.0 || p.x >= self.world_w || p.y >= self.world_h {
            return None;
        }
        let col = (p.x / self.world_w * self.cols as f32) as u16;
        let row = 1 + (p.y / self.world_h * self.field_rows() as f32) as u16;
        Some((col.min(self.cols - 1), row.min(self.rows - 2)))
    }

    /// World distance covered by one terminal column.
    fn cell_width(&self) -> f32 {
        self.world_w / self.cols as f32
    }

    fn row_height(&self) -> f32 {
        self.world_h / self.field_rows() as f32
    }
}

fn plot<W: Write>(out: &mut W, vp: &Viewport, p: Point, glyph: &str) -> std::io::Result<()> {
    if let Some((col, row)) = vp.cell(p) {
        out.queue(cursor::MoveTo(col, row))?;
        out.queue(Print(glyph))?;
    }
    Ok(())
}

/// Dotted segment between two world points.
fn line<W: Write>(
    out: &mut W,
    vp: &Viewport,
    from: Point,
    to: Point,
    steps: usize,
    glyph: &str,
) -> std::io::Result<()> {
    for i in 0..=steps {
        let t = i as f32 / steps.max(1) as f32;
        plot(out, vp, from.lerp(to, t), glyph)?;
    }
    Ok(())
}

fn centered<W: Write>(
    out: &mut W,
    cols: u16,
    row: u16,
    text: &str,
    color: Color,
) -> std::io::Result<()> {
    let col = (cols / 2).saturating_sub(text.chars().count() as u16 / 2);
    out.queue(cursor::MoveTo(col, row))?;
    out.queue(style::SetForegroundColor(color))?;
    out.queue(Print(text))?;
    Ok(())
}

// ── Public entry point ────────────────────────────────────────────────────────

/// Render one complete frame.
pub fn render<W: Write>(
    out: &mut W,
    session: &GameSession,
    high_score: u32,
    fast_forward: bool,
) -> std::io::Result<()> {
    let (cols, rows) = terminal::size()?;
    let world = &session.config().world;
    let vp = Viewport::new(cols, rows, world.width, world.height);

    out.queue(terminal::Clear(terminal::ClearType::All))?;

    draw_ground(out, &vp, session)?;
    for explosion in &session.explosions {
        draw_explosion(out, &vp, explosion)?;
    }
    for missile in &session.missiles {
        draw_missile(out, &vp, missile)?;
    }
    for powerup in &session.powerups {
        draw_powerup(out, &vp, powerup)?;
    }
    draw_turret(out, &vp, session)?;
    draw_hud(out, &vp, session, high_score, fast_forward)?;
    draw_controls_hint(out, &vp)?;

    if session.status() == GameStatus::GameOver {
        draw_game_over(out, &vp, session.score(), high_score)?;
    }

    // Park cursor in a harmless spot and flush
    out.queue(style::ResetColor)?;
    out.queue(cursor::MoveTo(0, rows.saturating_sub(1)))?;
    out.flush()?;
    Ok(())
}

// ── HUD (row 0) ───────────────────────────────────────────────────────────────

fn draw_hud<W: Write>(
    out: &mut W,
    vp: &Viewport,
    session: &GameSession,
    high_score: u32,
    fast_forward: bool,
) -> std::io::Result<()> {
    let best = high_score.max(session.score());
    out.queue(cursor::MoveTo(1, 0))?;
    out.queue(style::SetForegroundColor(C_HUD_SCORE))?;
    out.queue(Print(format!(
        "Score:{:>9}  Hi:{:>9}",
        group_thousands(session.score()),
        group_thousands(best)
    )))?;

    let level = session.level();
    let level_str = format!("[ LEVEL {} ]", level.difficulty());
    centered(out, vp.cols, 0, &level_str, C_HUD_LEVEL)?;

    // Right side: multiplier countdown, turbo, typed buffer
    let fps = session.config().timing.fps.max(1);
    let mut right = String::new();
    if level.multiplier_frames_left() > 0 {
        right.push_str(&format!(
            "[x{} {:>2}s] ",
            level.score_multiplier(),
            level.multiplier_frames_left() / fps + 1
        ));
    }
    if level.turbo_active() {
        right.push_str("[TURBO] ");
    } else if fast_forward {
        right.push_str("[>>] ");
    }
    right.push_str(&format!("> {:<10}", session.buffer()));

    let rx = vp.cols.saturating_sub(right.chars().count() as u16 + 1);
    out.queue(cursor::MoveTo(rx, 0))?;
    out.queue(style::SetForegroundColor(C_HUD_BUFFER))?;
    out.queue(Print(&right))?;
    Ok(())
}

// ── Scenery ───────────────────────────────────────────────────────────────────

fn draw_ground<W: Write>(out: &mut W, vp: &Viewport, session: &GameSession) -> std::io::Result<()> {
    let ground_y = session.config().world.ground_y();
    if let Some((_, row)) = vp.cell(Point::new(0.0, ground_y)) {
        out.queue(style::SetForegroundColor(C_GROUND))?;
        out.queue(cursor::MoveTo(0, row))?;
        out.queue(Print("▀".repeat(vp.cols as usize)))?;
    }

    out.queue(style::SetForegroundColor(C_CITY))?;
    for city in &session.cities {
        // One row above the ground line, three cells wide
        let above = Point::new(city.pos.x - vp.cell_width(), city.pos.y - vp.row_height());
        plot(out, vp, above, "▟█▙")?;
    }
    Ok(())
}

fn draw_turret<W: Write>(out: &mut W, vp: &Viewport, session: &GameSession) -> std::io::Result<()> {
    let turret = &session.turret;
    let color = if turret.is_powered() { C_TURRET_POWERED } else { C_TURRET };
    let muzzle = turret.barrel_end(BARREL_LENGTH);

    if let Some((target, opacity)) = turret.laser() {
        let laser_color = if opacity > 0.5 { C_LASER } else { C_LASER_FADED };
        out.queue(style::SetForegroundColor(laser_color))?;
        let steps = (muzzle.distance(target) / vp.cell_width()).ceil() as usize;
        line(out, vp, muzzle, target, steps.max(1), "·")?;
    }

    out.queue(style::SetForegroundColor(color))?;
    line(out, vp, turret.base(), muzzle, 4, "•")?;
    plot(out, vp, Point::new(turret.base().x, turret.base().y - vp.row_height()), "▲")?;
    Ok(())
}

// ── Targets ───────────────────────────────────────────────────────────────────

/// Label text with the typed prefix highlighted.
fn draw_label<W: Write>(
    out: &mut W,
    vp: &Viewport,
    anchor: Point,
    label: &str,
    typed: &str,
) -> std::io::Result<()> {
    let Some((col, row)) = vp.cell(anchor) else {
        return Ok(());
    };
    let width = label.chars().count() as u16;
    let col = col.saturating_sub(width / 2).min(vp.cols.saturating_sub(width));
    let typed_len = typed.chars().count();

    out.queue(cursor::MoveTo(col, row))?;
    out.queue(style::SetAttribute(Attribute::Bold))?;
    out.queue(style::SetForegroundColor(C_TYPED))?;
    out.queue(Print(label.chars().take(typed_len).collect::<String>()))?;
    out.queue(style::SetForegroundColor(C_LABEL))?;
    out.queue(Print(label.chars().skip(typed_len).collect::<String>()))?;
    out.queue(style::SetAttribute(Attribute::Reset))?;
    Ok(())
}

fn draw_missile<W: Write>(out: &mut W, vp: &Viewport, missile: &Missile) -> std::io::Result<()> {
    out.queue(style::SetForegroundColor(C_TRAIL))?;
    line(out, vp, missile.origin, missile.pos, TRAIL_STEPS, "·")?;

    out.queue(style::SetForegroundColor(C_WARHEAD))?;
    plot(out, vp, missile.pos, "▼")?;

    if let Some(label) = &missile.label {
        let below = Point::new(missile.pos.x, missile.pos.y + vp.row_height());
        draw_label(out, vp, below, label, &missile.typed_chars)?;
    }
    Ok(())
}

fn draw_powerup<W: Write>(out: &mut W, vp: &Viewport, powerup: &Powerup) -> std::io::Result<()> {
    let hull = match (powerup.flash_timer / 8) % 3 {
        0 => Color::Magenta,
        1 => Color::Cyan,
        _ => Color::Yellow,
    };
    out.queue(style::SetForegroundColor(hull))?;
    plot(out, vp, Point::new(powerup.pos.x - vp.cell_width(), powerup.pos.y), "<◆>")?;

    if let Some(label) = &powerup.label {
        let below = Point::new(powerup.pos.x, powerup.pos.y + vp.row_height());
        draw_label(out, vp, below, label, &powerup.typed_chars)?;
    }
    Ok(())
}

// ── Explosions ────────────────────────────────────────────────────────────────

fn draw_explosion<W: Write>(out: &mut W, vp: &Viewport, explosion: &Explosion) -> std::io::Result<()> {
    let (color, glyph) = match explosion.kind {
        ExplosionKind::Nuke => (Color::DarkYellow, "▒"),
        ExplosionKind::Intercept => (Color::White, "*"),
        ExplosionKind::Flash => (Color::Magenta, "+"),
    };
    out.queue(style::SetForegroundColor(color))?;

    let r = explosion.radius;
    let points = ((r / vp.cell_width()) * 6.0).ceil().max(6.0) as usize;
    for i in 0..points {
        let theta = i as f32 / points as f32 * std::f32::consts::TAU;
        let p = Point::new(
            explosion.center.x + r * theta.cos(),
            explosion.center.y + r * theta.sin(),
        );
        plot(out, vp, p, glyph)?;
    }
    Ok(())
}

// ── Controls hint (last row) ──────────────────────────────────────────────────

fn draw_controls_hint<W: Write>(out: &mut W, vp: &Viewport) -> std::io::Result<()> {
    out.queue(cursor::MoveTo(1, vp.rows.saturating_sub(1)))?;
    out.queue(style::SetForegroundColor(C_HINT))?;
    out.queue(Print("Type the labels   SPACE (hold) : Fast-forward   ESC : Pause   Ctrl-C : Quit"))?;
    Ok(())
}

// ── Overlays ──────────────────────────────────────────────────────────────────

fn draw_game_over<W: Write>(
    out: &mut W,
    vp: &Viewport,
    score: u32,
    high_score: u32,
) -> std::io::Result<()> {
    let lines: &[&str] = &[
        "╔════════════════════╗",
        "║    GAME  OVER      ║",
        "╚════════════════════╝",
    ];
    let start_row = (vp.rows / 2).saturating_sub(3);
    for (i, msg) in lines.iter().enumerate() {
        centered(out, vp.cols, start_row + i as u16, msg, Color::Red)?;
    }

    let score_row = start_row + lines.len() as u16;
    let score_line = format!("Final Score: {:>9}", group_thousands(score));
    centered(out, vp.cols, score_row, &score_line, Color::Yellow)?;
    if score > high_score {
        centered(out, vp.cols, score_row + 1, "★ NEW BEST ★", Color::Yellow)?;
    }
    Ok(())
}

/// Banner shown between levels; the caller holds it for the level pause.
pub fn draw_level_banner<W: Write>(out: &mut W, level: u32) -> std::io::Result<()> {
    let (cols, rows) = terminal::size()?;
    let cy = rows / 2;
    centered(out, cols, cy.saturating_sub(1), "╔══════════════════╗", Color::Cyan)?;
    centered(out, cols, cy, &format!("║    LEVEL {:<4}    ║", level), Color::Cyan)?;
    centered(out, cols, cy + 1, "╚══════════════════╝", Color::Cyan)?;
    out.queue(style::ResetColor)?;
    out.flush()?;
    Ok(())
}

pub fn draw_pause<W: Write>(out: &mut W) -> std::io::Result<()> {
    let (cols, rows) = terminal::size()?;
    let cy = rows / 2;
    centered(out, cols, cy, "  PAUSED  ", Color::White)?;
    centered(out, cols, cy + 1, " P : Resume   Ctrl-C : Quit ", C_HINT)?;
    out.queue(style::ResetColor)?;
    out.flush()?;
    Ok(())
}

/// Name prompt for a score that made the table.
pub fn draw_name_entry<W: Write>(
    out: &mut W,
    score: u32,
    rank: usize,
    input: &NameInput,
) -> std::io::Result<()> {
    let (cols, rows) = terminal::size()?;
    let cy = rows / 2;
    out.queue(terminal::Clear(terminal::ClearType::All))?;
    centered(out, cols, cy.saturating_sub(4), "★  NEW HIGH SCORE  ★", Color::Yellow)?;
    let line = format!("#{}  {}", rank + 1, group_thousands(score));
    centered(out, cols, cy.saturating_sub(2), &line, Color::White)?;
    centered(out, cols, cy, "Enter your name:", C_HINT)?;
    centered(out, cols, cy + 1, &format!("[{:<10}]", input.text()), Color::Green)?;
    centered(out, cols, cy + 3, "ENTER : Confirm   BACKSPACE : Delete", C_HINT)?;
    out.queue(style::ResetColor)?;
    out.flush()?;
    Ok(())
}

/// Top-ten table; `highlight` marks a freshly inserted row.
pub fn draw_high_scores<W: Write>(
    out: &mut W,
    table: &[ScoreEntry],
    highlight: Option<usize>,
) -> std::io::Result<()> {
    let (cols, rows) = terminal::size()?;
    let top = (rows / 2).saturating_sub(8);
    out.queue(terminal::Clear(terminal::ClearType::All))?;
    centered(out, cols, top, "HIGH SCORES", Color::Cyan)?;

    if table.is_empty() {
        centered(out, cols, top + 2, "no scores yet", C_HINT)?;
    }
    for (i, entry) in table.iter().enumerate() {
        let color = if Some(i) == highlight { Color::Yellow } else { Color::White };
        centered(out, cols, top + 2 + i as u16, &format_row(i, entry), color)?;
    }

    centered(out, cols, top + 14, "Press any key", C_HINT)?;
    out.queue(style::ResetColor)?;
    out.flush()?;
    Ok(())
}
