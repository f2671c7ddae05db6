use bevy::color::Alpha;
use bevy::prelude::*;

/// Anything whose opacity a `Fade` can drive. Each implementor gets its own
/// `apply_fade::<T>` system registered by the plugin.
pub trait Fadeable {
    fn set_opacity(&mut self, alpha: f32);
}

impl Fadeable for Sprite {
    fn set_opacity(&mut self, alpha: f32) {
        self.color.set_alpha(alpha);
    }
}

impl Fadeable for BackgroundColor {
    fn set_opacity(&mut self, alpha: f32) {
        self.0.set_alpha(alpha);
    }
}

impl Fadeable for TextColor {
    fn set_opacity(&mut self, alpha: f32) {
        self.0.set_alpha(alpha);
    }
}

/// Opacity animation. A fade-out with `despawn_when_clear` removes the
/// entity once it is fully transparent.
#[derive(Component, Debug, Clone)]
pub struct Fade {
    pub alpha: f32,
    pub target: f32,
    /// Alpha units per second.
    pub speed: f32,
    pub despawn_when_clear: bool,
}

impl Fade {
    pub fn fade_in(secs: f32) -> Self {
        Self {
            alpha: 0.0,
            target: 1.0,
            speed: speed_for(secs),
            despawn_when_clear: false,
        }
    }

    /// A fully visible entity that is already on its way out.
    pub fn departing(secs: f32) -> Self {
        Self {
            alpha: 1.0,
            target: 0.0,
            speed: speed_for(secs),
            despawn_when_clear: true,
        }
    }

    pub fn fade_out(&mut self, secs: f32) {
        self.target = 0.0;
        self.speed = speed_for(secs);
        self.despawn_when_clear = true;
    }

    pub fn is_settled(&self) -> bool {
        (self.alpha - self.target).abs() < f32::EPSILON
    }

    pub fn is_gone(&self) -> bool {
        self.despawn_when_clear && self.is_settled() && self.alpha <= 0.0
    }

    pub fn step(&mut self, dt: f32) {
        let diff = self.target - self.alpha;
        let delta = self.speed * dt;
        if diff.abs() <= delta {
            self.alpha = self.target;
        } else {
            self.alpha += diff.signum() * delta;
        }
    }
}

fn speed_for(secs: f32) -> f32 {
    if secs > 0.0 {
        1.0 / secs
    } else {
        f32::MAX
    }
}

/// System: animate every fade; despawn entities that finished fading out.
pub fn tick_fades(
    mut commands: Commands,
    time: Res<Time>,
    mut query: Query<(Entity, &mut Fade)>,
) {
    let dt = time.delta_secs();
    for (entity, mut fade) in &mut query {
        if !fade.is_settled() {
            fade.step(dt);
        }
        if fade.is_gone() {
            commands.entity(entity).despawn_recursive();
        }
    }
}

/// System: copy fade alpha onto the visual component `T`.
pub fn apply_fade<T: Component + Fadeable>(mut query: Query<(&Fade, &mut T), Changed<Fade>>) {
    for (fade, mut target) in &mut query {
        target.set_opacity(fade.alpha);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fade_in_reaches_full_opacity() {
        let mut fade = Fade::fade_in(0.5);
        fade.step(0.25);
        assert!((fade.alpha - 0.5).abs() < 1e-4);
        fade.step(0.5);
        assert_eq!(fade.alpha, 1.0);
        assert!(fade.is_settled());
        assert!(!fade.is_gone());
    }

    #[test]
    fn test_fade_out_marks_entity_gone() {
        let mut fade = Fade::fade_in(0.0);
        fade.step(0.016);
        assert_eq!(fade.alpha, 1.0, "zero duration is instant");
        fade.fade_out(0.1);
        fade.step(0.2);
        assert!(fade.is_gone());
    }

    #[test]
    fn test_departing_starts_visible() {
        let fade = Fade::departing(1.0);
        assert_eq!(fade.alpha, 1.0);
        assert!(!fade.is_gone());
    }
}
