use bevy::color::Alpha;
use bevy::prelude::*;
use crate::customers::CustomerVisual;

/// Placeholder tint per customer, stable across days.
fn tint_for(profile_id: &str) -> Color {
    let hash = profile_id
        .bytes()
        .fold(7u32, |acc, b| acc.wrapping_mul(31).wrapping_add(u32::from(b)));
    let hue = (hash % 360) as f32;
    Color::hsl(hue, 0.45, 0.6)
}

/// Dresses freshly arrived customers with a sprite and a name tag. The
/// customer plugin's fade systems take it from there.
pub fn dress_customer_visuals(
    mut commands: Commands,
    asset_server: Res<AssetServer>,
    query: Query<(Entity, &CustomerVisual), Added<CustomerVisual>>,
) {
    for (entity, visual) in &query {
        let mut sprite = match &visual.portrait {
            Some(path) => Sprite::from_image(asset_server.load(path.clone())),
            None => Sprite::from_color(tint_for(&visual.profile_id), Vec2::ONE),
        };
        sprite.custom_size = Some(Vec2::new(96.0, 144.0));
        sprite.color.set_alpha(0.0);

        commands
            .entity(entity)
            .insert((sprite, Visibility::default()))
            .with_children(|parent| {
                parent.spawn((
                    Text2d::new(visual.name.clone()),
                    TextFont {
                        font_size: 16.0,
                        ..default()
                    },
                    Transform::from_xyz(0.0, -88.0, 0.1),
                ));
            });
    }
}
