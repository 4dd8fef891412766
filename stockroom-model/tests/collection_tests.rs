use pretty_assertions::assert_eq;
use proptest::prelude::*;
use serde_json::json;
use stockroom_model::catalog::{ConfigFormBasic, PluginDetail, ProductBasic, TaxBasic};
use stockroom_model::{Collection, Entity, Record};
use stockroom_types::EntityId;

fn product(name: &str, tax_id: Option<EntityId>) -> ProductBasic {
    ProductBasic {
        id: EntityId::new(),
        parent_id: None,
        tax_id,
        manufacturer_id: None,
        unit_id: None,
        price_group_id: None,
        name: name.into(),
        active: true,
        stock: Some(10),
        price: Some(9.99),
    }
}

fn form(plugin_id: EntityId, name: &str) -> ConfigFormBasic {
    ConfigFormBasic {
        id: EntityId::new(),
        plugin_id: Some(plugin_id),
        parent_id: None,
        name: name.into(),
        label: None,
        description: None,
        position: 0,
    }
}

// ── Construction and lookup ──────────────────────────────────────

#[test]
fn collect_keeps_first_record_per_id() {
    let a = product("a", None);
    let mut dup = a.clone();
    dup.name = "dup".into();
    let b = product("b", None);

    let collection: Collection<ProductBasic> = vec![a.clone(), dup, b.clone()].into_iter().collect();
    assert_eq!(collection.len(), 2);
    assert_eq!(collection.get(&a.id).unwrap().name, "a");
    assert_eq!(collection.ids(), vec![a.id, b.id]);
}

#[test]
fn insert_replaces_in_place() {
    let a = product("a", None);
    let b = product("b", None);
    let mut collection: Collection<ProductBasic> = vec![a.clone(), b.clone()].into_iter().collect();

    let mut renamed = a.clone();
    renamed.name = "renamed".into();
    collection.insert(renamed);
    assert_eq!(collection.ids(), vec![a.id, b.id]);
    assert_eq!(collection.first().unwrap().name, "renamed");

    let c = product("c", None);
    collection.insert(c.clone());
    assert_eq!(collection.ids(), vec![a.id, b.id, c.id]);
}

#[test]
fn remove_and_contains() {
    let a = product("a", None);
    let mut collection: Collection<ProductBasic> = std::iter::once(a.clone()).collect();
    assert!(collection.contains(&a.id));
    assert_eq!(collection.remove(&a.id).unwrap().id, a.id);
    assert!(collection.is_empty());
    assert!(collection.remove(&a.id).is_none());
}

// ── Projections ──────────────────────────────────────────────────

#[test]
fn product_tax_ids_are_distinct_and_skip_none() {
    let t1 = EntityId::new();
    let t2 = EntityId::new();
    let collection: Collection<ProductBasic> = vec![
        product("a", Some(t1)),
        product("b", None),
        product("c", Some(t2)),
        product("d", Some(t1)),
    ]
    .into_iter()
    .collect();

    assert_eq!(collection.tax_ids(), vec![t1, t2]);
    let filtered = collection.filter_by_tax_id(t1);
    assert_eq!(filtered.fmap(|p| p.name.clone()), vec!["a", "d"]);
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
struct ProductWithTax {
    id: EntityId,
    tax: Option<TaxBasic>,
}

impl Record for ProductWithTax {
    fn id(&self) -> EntityId {
        self.id
    }
}

#[test]
fn related_collects_to_one_associations() {
    let tax = TaxBasic {
        id: EntityId::new(),
        rate: 19.0,
        name: "Standard".into(),
    };
    let products: Collection<ProductWithTax> = vec![
        ProductWithTax { id: EntityId::new(), tax: Some(tax.clone()) },
        ProductWithTax { id: EntityId::new(), tax: None },
        ProductWithTax { id: EntityId::new(), tax: Some(tax.clone()) },
    ]
    .into_iter()
    .collect();

    let taxes = products.related(|p| p.tax.as_ref());
    assert_eq!(taxes.ids(), vec![tax.id]);
}

#[test]
fn plugin_details_merge_nested_forms() {
    let p1 = EntityId::new();
    let p2 = EntityId::new();
    let detail = |id: EntityId, forms: Vec<ConfigFormBasic>| -> PluginDetail {
        serde_json::from_value(json!({
            "id": id.to_string(),
            "name": "n",
            "label": "l",
            "active": true,
            "version": "1",
            "capability_update": 1,
            "capability_install": 1,
            "capability_enable": 1,
            "config_forms": forms,
        }))
        .unwrap()
    };
    let plugins: Collection<PluginDetail> = vec![
        detail(p1, vec![form(p1, "a"), form(p1, "b")]),
        detail(p2, vec![form(p2, "c")]),
    ]
    .into_iter()
    .collect();

    let forms = plugins.config_forms();
    assert_eq!(forms.len(), 3);
    assert_eq!(forms.plugin_ids(), vec![p1, p2]);
    assert_eq!(forms.filter_by_plugin_id(p2).fmap(|f| f.name.clone()), vec!["c"]);
    assert!(plugins.payment_methods().is_empty());
}

// ── Ordering ─────────────────────────────────────────────────────

#[test]
fn sort_by_ids_puts_unlisted_last() {
    let a = product("a", None);
    let b = product("b", None);
    let c = product("c", None);
    let mut collection: Collection<ProductBasic> =
        vec![a.clone(), b.clone(), c.clone()].into_iter().collect();
    collection.sort_by_ids(&[c.id, a.id]);
    assert_eq!(collection.ids(), vec![c.id, a.id, b.id]);
}

proptest! {
    #[test]
    fn sort_by_ids_matches_requested_order(n in 1usize..20, seed in any::<u64>()) {
        let products: Vec<ProductBasic> = (0..n).map(|i| product(&i.to_string(), None)).collect();
        let mut order: Vec<EntityId> = products.iter().map(|p| p.id).collect();
        // deterministic shuffle
        let len = order.len();
        for i in 0..len {
            let j = ((seed as usize).wrapping_mul(31).wrapping_add(i * 17)) % len;
            order.swap(i, j);
        }
        let mut collection: Collection<ProductBasic> = products.into_iter().collect();
        collection.sort_by_ids(&order);
        prop_assert_eq!(collection.ids(), order);
    }
}

// ── Serialization ────────────────────────────────────────────────

#[test]
fn collection_serializes_as_array() {
    let a = product("a", None);
    let collection: Collection<ProductBasic> = std::iter::once(a.clone()).collect();
    let json = serde_json::to_value(&collection).unwrap();
    assert!(json.is_array());
    let back: Collection<ProductBasic> = serde_json::from_value(json).unwrap();
    assert_eq!(back, collection);
}

#[test]
fn raw_entity_into_record() {
    let id = EntityId::new();
    let entity = Entity::new(
        id,
        "tax",
        json!({ "id": id.to_string(), "rate": 7.0, "name": "Reduced" }),
    );
    assert_eq!(entity.data["name"], json!("Reduced"));
    let tax: TaxBasic = entity.into_record().unwrap();
    assert_eq!(tax.id(), id);
    assert_eq!(tax.rate, 7.0);
}

#[test]
fn raw_entity_with_wrong_shape_fails() {
    let entity = Entity::new(EntityId::new(), "tax", json!({ "rate": 7.0 }));
    assert!(entity.into_record::<TaxBasic>().is_err());
}
