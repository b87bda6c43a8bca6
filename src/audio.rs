/// Sound cues.  Playback is best-effort: implementations swallow their own
/// failures and the game never waits on them.

use std::io::Write;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Effect {
    Shoot,
    Intercept,
    Miss,
    Powerup,
    CityLost,
}

pub trait Audio {
    fn play(&mut self, effect: Effect);
}

/// Plays nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct Silent;

impl Audio for Silent {
    fn play(&mut self, _effect: Effect) {}
}

/// Rings the terminal bell for the cues that need the player's attention.
pub struct TerminalBell<W: Write> {
    out: W,
}

impl<W: Write> TerminalBell<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }
}

impl<W: Write> Audio for TerminalBell<W> {
    fn play(&mut self, effect: Effect) {
        if matches!(effect, Effect::Miss | Effect::CityLost) {
            let _ = self.out.write_all(b"\x07");
            let _ = self.out.flush();
        }
    }
}

pub fn from_config(sound: bool) -> Box<dyn Audio> {
    if sound {
        Box::new(TerminalBell::new(std::io::stdout()))
    } else {
        Box::new(Silent)
    }
}
