use crate::shared::*;

/// The drinks on the counter. Ids are what profiles ask for and what the
/// serve tray sends.
pub fn populate_items(catalog: &mut ItemCatalog) {
    let menu = [
        ("teh_manis", "Es Teh Manis", 5),
        ("es_jeruk", "Es Jeruk", 7),
        ("kopi_tubruk", "Kopi Tubruk", 8),
        ("kopi_susu", "Kopi Susu", 12),
        ("cokelat_panas", "Cokelat Panas", 10),
        ("wedang_jahe", "Wedang Jahe", 9),
    ];

    catalog.items = menu
        .iter()
        .map(|&(id, name, price)| ItemDef {
            id: id.into(),
            name: name.into(),
            price,
        })
        .collect();
}
