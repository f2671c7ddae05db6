use bevy::prelude::*;
use crate::shared::*;

/// Marker for the screen fade overlay
#[derive(Component)]
pub struct ScreenFadeOverlay;

/// Resource that drives the closing-time fade
#[derive(Resource)]
pub struct ScreenFade {
    /// Current opacity 0.0 (transparent) to 1.0 (opaque black)
    pub alpha: f32,
    pub target_alpha: f32,
    /// Alpha units per second
    pub speed: f32,
    pub active: bool,
}

impl Default for ScreenFade {
    fn default() -> Self {
        Self {
            alpha: 0.0,
            target_alpha: 0.0,
            speed: 1.0,
            active: false,
        }
    }
}

/// Spawn the fade overlay (always present but invisible)
pub fn spawn_fade_overlay(mut commands: Commands) {
    commands.insert_resource(ScreenFade::default());

    commands.spawn((
        ScreenFadeOverlay,
        Node {
            width: Val::Percent(100.0),
            height: Val::Percent(100.0),
            position_type: PositionType::Absolute,
            ..default()
        },
        BackgroundColor(Color::srgba(0.0, 0.0, 0.0, 0.0)),
        GlobalZIndex(100),
        PickingBehavior::IGNORE,
    ));
}

/// Dim the shop at closing time, brighten it when the next day opens.
pub fn trigger_fade_on_day_change(
    mut ended: EventReader<DayEndedEvent>,
    mut started: EventReader<DayStartedEvent>,
    config: Res<ShopConfig>,
    mut fade: ResMut<ScreenFade>,
) {
    for _ in ended.read() {
        fade.target_alpha = 0.7;
        fade.speed = 0.7 / config.day_end_secs.max(0.1);
        fade.active = true;
    }
    for _ in started.read() {
        fade.target_alpha = 0.0;
        fade.speed = 2.0;
        fade.active = true;
    }
}

/// Animate the fade overlay
pub fn update_fade(
    time: Res<Time>,
    mut fade: ResMut<ScreenFade>,
    mut query: Query<&mut BackgroundColor, With<ScreenFadeOverlay>>,
) {
    if !fade.active {
        return;
    }

    let diff = fade.target_alpha - fade.alpha;
    let step = fade.speed * time.delta_secs();
    if diff.abs() <= step {
        fade.alpha = fade.target_alpha;
        fade.active = false;
    } else {
        fade.alpha = (fade.alpha + diff.signum() * step).clamp(0.0, 1.0);
    }

    for mut bg in &mut query {
        *bg = BackgroundColor(Color::srgba(0.0, 0.0, 0.0, fade.alpha));
    }
}
