use spritestrip_engine::sprite::{SpriteDescriptor, SpriteImage};

/// xorshift32; deterministic per seed.
#[derive(Debug, Clone)]
pub struct Rng(u32);

impl Rng {
    pub fn new(seed: u32) -> Self {
        Self(seed.max(1))
    }

    pub fn next_u32(&mut self) -> u32 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.0 = x;
        x
    }

    /// Uniform in `[lo, hi)`.
    pub fn range(&mut self, lo: f32, hi: f32) -> f32 {
        let unit = (self.next_u32() >> 8) as f32 / (1u32 << 24) as f32;
        lo + (hi - lo) * unit
    }
}

/// One sprite bouncing off the drawing-buffer edges.
#[derive(Debug, Clone)]
pub struct Bouncer {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    vx: f32,
    vy: f32,
    pub angle: f32,
    spin: f32,
    pub scale: f32,
    frame: f32,
    frame_rate: f32,
}

impl Bouncer {
    pub fn spawn(rng: &mut Rng, width: f32, height: f32) -> Self {
        Self {
            x: rng.range(0.0, width),
            y: rng.range(0.0, height),
            z: rng.range(0.0, 1.0),
            vx: rng.range(-200.0, 200.0),
            vy: rng.range(-200.0, 200.0),
            angle: rng.range(0.0, std::f32::consts::TAU),
            spin: rng.range(-3.0, 3.0),
            scale: rng.range(0.5, 1.5),
            frame: rng.range(0.0, 64.0),
            frame_rate: rng.range(6.0, 18.0),
        }
    }

    pub fn update(&mut self, dt: f32, width: f32, height: f32) {
        self.x += self.vx * dt;
        self.y += self.vy * dt;

        if self.x < 0.0 || self.x > width {
            self.vx = -self.vx;
            self.x = self.x.clamp(0.0, width);
        }
        if self.y < 0.0 || self.y > height {
            self.vy = -self.vy;
            self.y = self.y.clamp(0.0, height);
        }

        self.angle = (self.angle + self.spin * dt) % std::f32::consts::TAU;
        self.frame += self.frame_rate * dt;
    }

    /// Cell index grows without bound; the sheet wraps it.
    pub fn descriptor<'a>(&self, sheet: &'a SpriteImage) -> SpriteDescriptor<'a> {
        SpriteDescriptor::new(sheet, self.x, self.y)
            .with_depth(self.z)
            .with_angle(self.angle)
            .with_scale(self.scale)
            .with_cell(self.frame as u32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rng_range_stays_in_bounds() {
        let mut rng = Rng::new(7);
        for _ in 0..1000 {
            let v = rng.range(-2.0, 3.0);
            assert!((-2.0..3.0).contains(&v));
        }
    }

    #[test]
    fn bouncer_reflects_off_the_right_edge() {
        let mut rng = Rng::new(1);
        let mut b = Bouncer::spawn(&mut rng, 100.0, 100.0);
        b.x = 99.0;
        b.vx = 50.0;
        b.update(0.1, 100.0, 100.0);
        assert_eq!(b.x, 100.0);
        assert!(b.vx < 0.0);
    }

    #[test]
    fn bouncers_stay_inside_the_buffer() {
        let mut rng = Rng::new(42);
        let mut bouncers: Vec<_> = (0..64).map(|_| Bouncer::spawn(&mut rng, 320.0, 200.0)).collect();
        for _ in 0..500 {
            for b in &mut bouncers {
                b.update(1.0 / 60.0, 320.0, 200.0);
            }
        }
        assert!(bouncers.iter().all(|b| (0.0..=320.0).contains(&b.x) && (0.0..=200.0).contains(&b.y)));
    }
}
