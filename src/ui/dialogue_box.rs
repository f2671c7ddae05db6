use bevy::prelude::*;
use crate::dialogue::DialoguePlayer;
use crate::shared::*;

// ═══════════════════════════════════════════════════════════════════════
// MARKER COMPONENTS
// ═══════════════════════════════════════════════════════════════════════

#[derive(Component)]
pub struct DialogueBoxRoot;

#[derive(Component)]
pub struct DialogueSpeakerName;

#[derive(Component)]
pub struct DialogueText;

#[derive(Component)]
pub struct DialoguePrompt;

/// One of the K choice slots. Hidden when the prompt has fewer choices.
#[derive(Component)]
pub struct ChoiceButton {
    pub index: usize,
}

#[derive(Component)]
pub struct ChoiceButtonLabel {
    pub index: usize,
}

const CHOICE_IDLE: Color = Color::srgb(0.22, 0.16, 0.12);
const CHOICE_HOVER: Color = Color::srgb(0.36, 0.26, 0.18);

// ═══════════════════════════════════════════════════════════════════════
// SURFACE
// ═══════════════════════════════════════════════════════════════════════

/// The panel below is the player's presentation surface.
pub fn attach_dialogue_surface(mut player: ResMut<DialoguePlayer>) {
    player.attach_surface();
    info!("[UI/Dialogue] Dialogue surface attached");
}

// ═══════════════════════════════════════════════════════════════════════
// SPAWN
// ═══════════════════════════════════════════════════════════════════════

/// Spawns the panel once, hidden. `sync_dialogue_box` shows and fills it.
pub fn spawn_dialogue_box(mut commands: Commands, player: Res<DialoguePlayer>) {
    let buttons = player.settings().max_choice_buttons;

    commands
        .spawn((
            DialogueBoxRoot,
            Node {
                width: Val::Percent(100.0),
                height: Val::Percent(100.0),
                position_type: PositionType::Absolute,
                justify_content: JustifyContent::FlexEnd,
                align_items: AlignItems::Center,
                flex_direction: FlexDirection::Column,
                padding: UiRect::bottom(Val::Px(90.0)),
                ..default()
            },
            Visibility::Hidden,
            PickingBehavior::IGNORE,
        ))
        .with_children(|parent| {
            parent
                .spawn((
                    Node {
                        width: Val::Px(700.0),
                        min_height: Val::Px(150.0),
                        flex_direction: FlexDirection::Column,
                        padding: UiRect::all(Val::Px(16.0)),
                        row_gap: Val::Px(8.0),
                        border: UiRect::all(Val::Px(2.0)),
                        ..default()
                    },
                    BackgroundColor(Color::srgba(0.08, 0.06, 0.05, 0.92)),
                    BorderColor(Color::srgb(0.6, 0.45, 0.3)),
                ))
                .with_children(|panel| {
                    panel.spawn((
                        DialogueSpeakerName,
                        Text::new(""),
                        TextFont {
                            font_size: 18.0,
                            ..default()
                        },
                        TextColor(Color::srgb(1.0, 0.9, 0.6)),
                    ));

                    panel.spawn((
                        DialogueText,
                        Text::new(""),
                        TextFont {
                            font_size: 16.0,
                            ..default()
                        },
                        TextColor(Color::WHITE),
                    ));

                    panel
                        .spawn(Node {
                            flex_direction: FlexDirection::Column,
                            row_gap: Val::Px(4.0),
                            ..default()
                        })
                        .with_children(|list| {
                            for index in 0..buttons {
                                list.spawn((
                                    ChoiceButton { index },
                                    Button,
                                    Node {
                                        padding: UiRect::axes(Val::Px(10.0), Val::Px(4.0)),
                                        ..default()
                                    },
                                    BackgroundColor(CHOICE_IDLE),
                                    Visibility::Hidden,
                                ))
                                .with_children(|button| {
                                    button.spawn((
                                        ChoiceButtonLabel { index },
                                        Text::new(""),
                                        TextFont {
                                            font_size: 15.0,
                                            ..default()
                                        },
                                        TextColor(Color::srgb(0.95, 0.9, 0.8)),
                                    ));
                                });
                            }
                        });

                    panel.spawn((
                        DialoguePrompt,
                        Text::new(""),
                        TextFont {
                            font_size: 12.0,
                            ..default()
                        },
                        TextColor(Color::srgb(0.6, 0.6, 0.6)),
                    ));
                });
        });
}

// ═══════════════════════════════════════════════════════════════════════
// SYNC: mirror DialoguePlayer::view into the panel
// ═══════════════════════════════════════════════════════════════════════

#[allow(clippy::type_complexity)]
pub fn sync_dialogue_box(
    player: Res<DialoguePlayer>,
    mut root_query: Query<&mut Visibility, With<DialogueBoxRoot>>,
    mut button_query: Query<(&ChoiceButton, &mut Visibility), Without<DialogueBoxRoot>>,
    mut speaker_query: Query<&mut Text, With<DialogueSpeakerName>>,
    mut body_query: Query<&mut Text, (With<DialogueText>, Without<DialogueSpeakerName>)>,
    mut prompt_query: Query<
        &mut Text,
        (
            With<DialoguePrompt>,
            Without<DialogueText>,
            Without<DialogueSpeakerName>,
        ),
    >,
    mut label_query: Query<
        (&ChoiceButtonLabel, &mut Text),
        (
            Without<DialoguePrompt>,
            Without<DialogueText>,
            Without<DialogueSpeakerName>,
        ),
    >,
) {
    if !player.is_changed() {
        return;
    }
    let view = player.view();

    for mut visibility in &mut root_query {
        *visibility = if view.visible {
            Visibility::Inherited
        } else {
            Visibility::Hidden
        };
    }
    if !view.visible {
        return;
    }

    for mut text in &mut speaker_query {
        **text = view.speaker.clone().unwrap_or_default();
    }
    for mut text in &mut body_query {
        **text = view.visible_text();
    }
    for mut text in &mut prompt_query {
        **text = if view.awaiting_continue {
            "[Space] Continue".to_string()
        } else if !view.choices.is_empty() {
            "[1-3] Choose".to_string()
        } else {
            String::new()
        };
    }

    for (button, mut visibility) in &mut button_query {
        *visibility = if button.index < view.choices.len() {
            Visibility::Inherited
        } else {
            Visibility::Hidden
        };
    }
    for (label, mut text) in &mut label_query {
        if let Some(choice) = view.choices.get(label.index) {
            **text = format!("{}. {}", label.index + 1, choice);
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════
// INTERACTION: clicks become ShopInput
// ═══════════════════════════════════════════════════════════════════════

#[allow(clippy::type_complexity)]
pub fn choice_button_clicks(
    mut query: Query<
        (&Interaction, &ChoiceButton, &Visibility, &mut BackgroundColor),
        Changed<Interaction>,
    >,
    mut input: ResMut<ShopInput>,
) {
    for (interaction, button, visibility, mut bg) in &mut query {
        if *visibility == Visibility::Hidden {
            continue;
        }
        match interaction {
            Interaction::Pressed => {
                // First click in a frame wins; the player hides the rest.
                if input.choice.is_none() {
                    input.choice = Some(button.index);
                }
            }
            Interaction::Hovered => bg.0 = CHOICE_HOVER,
            Interaction::None => bg.0 = CHOICE_IDLE,
        }
    }
}
