use crate::shared::*;

fn script(name: &str) -> ScriptHandle {
    ScriptHandle::new(name)
}

/// The regulars. `order_scripts` lines up with `preferred_items`; a `None`
/// (or a missing trailing entry) means the customer just says the
/// placeholder order line.
pub fn populate_profiles(store: &mut ProfileStore) {
    store.profiles = vec![
        CustomerProfile {
            id: "rina".into(),
            name: "Rina".into(),
            portrait: Some("portraits/rina.png".into()),
            preferred_items: vec!["teh_manis".into(), "es_jeruk".into()],
            order_scripts: vec![
                Some(script("rina_order_teh")),
                Some(script("rina_order_jeruk")),
            ],
            curhat_scripts: vec![script("rina_exam"), script("rina_roommate")],
            max_fails: 2,
        },
        CustomerProfile {
            id: "pak_budi".into(),
            name: "Pak Budi".into(),
            portrait: Some("portraits/budi.png".into()),
            preferred_items: vec!["kopi_tubruk".into(), "wedang_jahe".into()],
            order_scripts: vec![Some(script("budi_order_kopi")), None],
            curhat_scripts: vec![script("budi_garden")],
            max_fails: 3,
        },
        CustomerProfile {
            id: "dewi".into(),
            name: "Dewi".into(),
            portrait: Some("portraits/dewi.png".into()),
            preferred_items: vec!["kopi_susu".into()],
            order_scripts: vec![Some(script("dewi_order_kopi_susu"))],
            curhat_scripts: vec![script("dewi_boss"), script("dewi_promotion")],
            max_fails: 1,
        },
        CustomerProfile {
            id: "andi".into(),
            name: "Andi".into(),
            portrait: None,
            preferred_items: vec!["cokelat_panas".into(), "es_jeruk".into()],
            order_scripts: vec![Some(script("andi_order_cokelat"))],
            curhat_scripts: vec![script("andi_stream")],
            max_fails: 2,
        },
        CustomerProfile {
            id: "bu_sari".into(),
            name: "Bu Sari".into(),
            portrait: Some("portraits/sari.png".into()),
            preferred_items: vec!["wedang_jahe".into(), "teh_manis".into()],
            order_scripts: vec![Some(script("sari_order_jahe")), None],
            curhat_scripts: vec![script("sari_market")],
            max_fails: 2,
        },
    ];
}
