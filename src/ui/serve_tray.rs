use bevy::prelude::*;
use crate::shared::*;

/// Marker for the row of item buttons along the bottom edge.
#[derive(Component)]
pub struct ServeTrayRoot;

#[derive(Component)]
pub struct ServeButton {
    pub item_id: ItemId,
}

const TRAY_IDLE: Color = Color::srgb(0.35, 0.22, 0.12);
const TRAY_HOVER: Color = Color::srgb(0.5, 0.32, 0.18);

/// One button per catalog item, numbered to match the serve hotkeys.
pub fn spawn_serve_tray(mut commands: Commands, catalog: Res<ItemCatalog>) {
    commands
        .spawn((
            ServeTrayRoot,
            Node {
                width: Val::Percent(100.0),
                position_type: PositionType::Absolute,
                bottom: Val::Px(12.0),
                flex_direction: FlexDirection::Row,
                justify_content: JustifyContent::Center,
                column_gap: Val::Px(8.0),
                ..default()
            },
            PickingBehavior::IGNORE,
        ))
        .with_children(|tray| {
            for (i, item) in catalog.items.iter().enumerate() {
                let label = if i < 9 {
                    format!("{} {}", i + 1, item.name)
                } else {
                    item.name.clone()
                };
                tray.spawn((
                    ServeButton {
                        item_id: item.id.clone(),
                    },
                    Button,
                    Node {
                        padding: UiRect::axes(Val::Px(10.0), Val::Px(6.0)),
                        border: UiRect::all(Val::Px(1.0)),
                        ..default()
                    },
                    BackgroundColor(TRAY_IDLE),
                    BorderColor(Color::srgb(0.7, 0.55, 0.35)),
                ))
                .with_children(|button| {
                    button.spawn((
                        Text::new(label),
                        TextFont {
                            font_size: 14.0,
                            ..default()
                        },
                        TextColor(Color::WHITE),
                    ));
                });
            }
        });
}

/// Clicks hand the item over. The orchestrator decides whether it counts.
pub fn serve_button_clicks(
    mut query: Query<(&Interaction, &ServeButton, &mut BackgroundColor), Changed<Interaction>>,
    mut serve: EventWriter<ServeEvent>,
) {
    for (interaction, button, mut bg) in &mut query {
        match interaction {
            Interaction::Pressed => {
                serve.send(ServeEvent {
                    item_id: button.item_id.clone(),
                });
            }
            Interaction::Hovered => bg.0 = TRAY_HOVER,
            Interaction::None => bg.0 = TRAY_IDLE,
        }
    }
}
