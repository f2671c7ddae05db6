use bevy::prelude::*;
use crate::customers::Fade;
use crate::shared::*;

/// A short message for the toast column.
#[derive(Event, Debug, Clone)]
pub struct ToastEvent {
    pub message: String,
    pub duration_secs: f32,
}

const MAX_TOASTS: usize = 3;
const TOAST_FADE_SECS: f32 = 0.5;

// ═══════════════════════════════════════════════════════════════════════
// COMPONENTS
// ═══════════════════════════════════════════════════════════════════════

/// Marker for the toast container node (top-center of screen).
#[derive(Component)]
pub struct ToastContainer;

/// One toast. When `timer` runs out the toast gets a departing `Fade`.
#[derive(Component)]
pub struct ToastItem {
    pub timer: Timer,
}

// ═══════════════════════════════════════════════════════════════════════
// SPAWN CONTAINER
// ═══════════════════════════════════════════════════════════════════════

pub fn spawn_toast_container(mut commands: Commands) {
    commands.spawn((
        ToastContainer,
        Node {
            position_type: PositionType::Absolute,
            top: Val::Px(60.0),
            left: Val::Percent(50.0),
            width: Val::Px(420.0),
            // Shift left by half of the width to centre the column.
            margin: UiRect {
                left: Val::Px(-210.0),
                ..default()
            },
            flex_direction: FlexDirection::Column,
            row_gap: Val::Px(6.0),
            align_items: AlignItems::Center,
            ..default()
        },
        PickingBehavior::IGNORE,
    ));
}

// ═══════════════════════════════════════════════════════════════════════
// HANDLE TOAST EVENTS: spawn a child node per event
// ═══════════════════════════════════════════════════════════════════════

pub fn handle_toast_events(
    mut commands: Commands,
    mut events: EventReader<ToastEvent>,
    container_query: Query<Entity, With<ToastContainer>>,
    existing_toasts: Query<Entity, With<ToastItem>>,
) {
    let Ok(container) = container_query.get_single() else {
        return;
    };

    let mut live: Vec<Entity> = existing_toasts.iter().collect();
    for event in events.read() {
        if live.len() >= MAX_TOASTS {
            let oldest = live.remove(0);
            commands.entity(oldest).despawn_recursive();
        }

        let toast = commands
            .spawn((
                ToastItem {
                    timer: Timer::from_seconds(event.duration_secs.max(0.0), TimerMode::Once),
                },
                Node {
                    padding: UiRect::axes(Val::Px(12.0), Val::Px(5.0)),
                    border: UiRect::all(Val::Px(1.0)),
                    ..default()
                },
                Text::new(event.message.clone()),
                TextFont {
                    font_size: 14.0,
                    ..default()
                },
                TextColor(Color::WHITE),
                BackgroundColor(Color::srgba(0.0, 0.0, 0.0, 0.75)),
                BorderColor(Color::srgba(0.5, 0.5, 0.5, 0.5)),
                PickingBehavior::IGNORE,
            ))
            .id();

        commands.entity(container).add_child(toast);
        live.push(toast);
    }
}

// ═══════════════════════════════════════════════════════════════════════
// UPDATE TOASTS: hand expired toasts to the fade systems
// ═══════════════════════════════════════════════════════════════════════

pub fn update_toasts(
    mut commands: Commands,
    time: Res<Time>,
    mut toast_query: Query<(Entity, &mut ToastItem), Without<Fade>>,
) {
    for (entity, mut toast) in &mut toast_query {
        toast.timer.tick(time.delta());
        if toast.timer.just_finished() {
            commands.entity(entity).insert(Fade::departing(TOAST_FADE_SECS));
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════
// EVENT-TO-TOAST WIRING SYSTEMS
// ═══════════════════════════════════════════════════════════════════════

pub fn wire_speech_toasts(
    mut speech_events: EventReader<CustomerSpeechEvent>,
    mut toast_writer: EventWriter<ToastEvent>,
) {
    for event in speech_events.read() {
        toast_writer.send(ToastEvent {
            message: format!("{}: \"{}\"", event.speaker, event.text),
            duration_secs: event.duration_secs,
        });
    }
}

pub fn wire_day_toasts(
    mut started: EventReader<DayStartedEvent>,
    mut ended: EventReader<DayEndedEvent>,
    mut toast_writer: EventWriter<ToastEvent>,
) {
    for event in started.read() {
        toast_writer.send(ToastEvent {
            message: format!("Day {}: {} customers expected", event.day, event.customers),
            duration_secs: 3.0,
        });
    }
    for event in ended.read() {
        toast_writer.send(ToastEvent {
            message: format!("Day {} is over. Closing up...", event.day),
            duration_secs: 3.0,
        });
    }
}

pub fn wire_reaction_toasts(
    mut reactions: EventReader<ReactionEvent>,
    mut toast_writer: EventWriter<ToastEvent>,
) {
    for event in reactions.read() {
        let mood = match event.reaction {
            Reaction::Agree => "feels understood",
            Reaction::Neutral => "shrugs",
            Reaction::Disagree => "looks hurt",
        };
        toast_writer.send(ToastEvent {
            message: format!("{} {}", event.name, mood),
            duration_secs: 2.0,
        });
    }
}
