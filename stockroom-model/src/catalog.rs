//! Built-in entity catalog.
//!
//! Field tables are configuration data in `catalog.toml`; this module loads
//! them and declares the typed basic/detail projections of each type.

use serde::{Deserialize, Serialize};
use stockroom_types::EntityId;

use crate::{Collection, EntityDefinition, ModelResult, Record, SchemaRegistry};

/// Source of the built-in schemas.
pub const CATALOG_TOML: &str = include_str!("catalog.toml");

/// Loads and verifies the built-in schemas.
pub fn registry() -> ModelResult<SchemaRegistry> {
    SchemaRegistry::from_toml(CATALOG_TOML)
}

macro_rules! record {
    ($($ty:ty),+ $(,)?) => {
        $(impl Record for $ty {
            fn id(&self) -> EntityId {
                self.id
            }
        })+
    };
}

record!(
    PluginBasic,
    ConfigFormBasic,
    PaymentMethodBasic,
    ShopTemplateBasic,
    ShoppingWorldComponentBasic,
    TaxBasic,
    ProductBasic,
    OrderDeliveryPositionBasic,
);

impl Record for PluginDetail {
    fn id(&self) -> EntityId {
        self.plugin.id
    }
}

// ── plugin ──────────────────────────────────────────────────────

pub struct PluginDefinition;

impl EntityDefinition for PluginDefinition {
    const ENTITY_TYPE: &'static str = "plugin";
    type Basic = PluginBasic;
    type Detail = PluginDetail;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PluginBasic {
    pub id: EntityId,
    pub name: String,
    pub label: String,
    pub description: Option<String>,
    pub active: bool,
    pub version: String,
    pub author: Option<String>,
    pub license: Option<String>,
    pub installation_date: Option<String>,
    pub capability_update: i64,
    pub capability_install: i64,
    pub capability_enable: i64,
    pub capability_secure_uninstall: Option<i64>,
}

/// A plugin with every sub-resource expanded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PluginDetail {
    #[serde(flatten)]
    pub plugin: PluginBasic,
    #[serde(default)]
    pub config_forms: Collection<ConfigFormBasic>,
    #[serde(default)]
    pub payment_methods: Collection<PaymentMethodBasic>,
    #[serde(default)]
    pub shop_templates: Collection<ShopTemplateBasic>,
    #[serde(default)]
    pub shopping_world_components: Collection<ShoppingWorldComponentBasic>,
}

impl Collection<PluginDetail> {
    pub fn config_forms(&self) -> Collection<ConfigFormBasic> {
        self.related_many(|p| &p.config_forms)
    }

    pub fn payment_methods(&self) -> Collection<PaymentMethodBasic> {
        self.related_many(|p| &p.payment_methods)
    }

    pub fn shop_templates(&self) -> Collection<ShopTemplateBasic> {
        self.related_many(|p| &p.shop_templates)
    }

    pub fn shopping_world_components(&self) -> Collection<ShoppingWorldComponentBasic> {
        self.related_many(|p| &p.shopping_world_components)
    }
}

// ── plugin sub-resources ────────────────────────────────────────

pub struct ConfigFormDefinition;

impl EntityDefinition for ConfigFormDefinition {
    const ENTITY_TYPE: &'static str = "config_form";
    type Basic = ConfigFormBasic;
    type Detail = ConfigFormBasic;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigFormBasic {
    pub id: EntityId,
    pub plugin_id: Option<EntityId>,
    pub parent_id: Option<EntityId>,
    pub name: String,
    pub label: Option<String>,
    pub description: Option<String>,
    pub position: i64,
}

impl Collection<ConfigFormBasic> {
    pub fn plugin_ids(&self) -> Vec<EntityId> {
        self.referenced_ids(|f| f.plugin_id)
    }

    pub fn filter_by_plugin_id(&self, id: EntityId) -> Self {
        self.filter_by_reference(|f| f.plugin_id, id)
    }
}

pub struct PaymentMethodDefinition;

impl EntityDefinition for PaymentMethodDefinition {
    const ENTITY_TYPE: &'static str = "payment_method";
    type Basic = PaymentMethodBasic;
    type Detail = PaymentMethodBasic;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentMethodBasic {
    pub id: EntityId,
    pub plugin_id: Option<EntityId>,
    pub technical_name: String,
    pub name: String,
    pub additional_description: Option<String>,
    pub surcharge: Option<f64>,
    pub position: Option<i64>,
    pub active: bool,
}

pub struct ShopTemplateDefinition;

impl EntityDefinition for ShopTemplateDefinition {
    const ENTITY_TYPE: &'static str = "shop_template";
    type Basic = ShopTemplateBasic;
    type Detail = ShopTemplateBasic;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShopTemplateBasic {
    pub id: EntityId,
    pub plugin_id: Option<EntityId>,
    pub parent_id: Option<EntityId>,
    pub template: String,
    pub name: String,
    pub esi: bool,
    pub style_support: bool,
    pub version: i64,
}

pub struct ShoppingWorldComponentDefinition;

impl EntityDefinition for ShoppingWorldComponentDefinition {
    const ENTITY_TYPE: &'static str = "shopping_world_component";
    type Basic = ShoppingWorldComponentBasic;
    type Detail = ShoppingWorldComponentBasic;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShoppingWorldComponentBasic {
    pub id: EntityId,
    pub plugin_id: Option<EntityId>,
    pub name: String,
    pub x_type: String,
    pub convert_function: Option<String>,
    pub template: String,
    pub cls: String,
}

// ── product and tax ─────────────────────────────────────────────

pub struct TaxDefinition;

impl EntityDefinition for TaxDefinition {
    const ENTITY_TYPE: &'static str = "tax";
    type Basic = TaxBasic;
    type Detail = TaxBasic;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxBasic {
    pub id: EntityId,
    pub rate: f64,
    pub name: String,
}

pub struct ProductDefinition;

impl EntityDefinition for ProductDefinition {
    const ENTITY_TYPE: &'static str = "product";
    type Basic = ProductBasic;
    type Detail = ProductBasic;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductBasic {
    pub id: EntityId,
    pub parent_id: Option<EntityId>,
    pub tax_id: Option<EntityId>,
    pub manufacturer_id: Option<EntityId>,
    pub unit_id: Option<EntityId>,
    pub price_group_id: Option<EntityId>,
    pub name: String,
    pub active: bool,
    pub stock: Option<i64>,
    pub price: Option<f64>,
}

impl Collection<ProductBasic> {
    pub fn parent_ids(&self) -> Vec<EntityId> {
        self.referenced_ids(|p| p.parent_id)
    }

    pub fn filter_by_parent_id(&self, id: EntityId) -> Self {
        self.filter_by_reference(|p| p.parent_id, id)
    }

    pub fn tax_ids(&self) -> Vec<EntityId> {
        self.referenced_ids(|p| p.tax_id)
    }

    pub fn filter_by_tax_id(&self, id: EntityId) -> Self {
        self.filter_by_reference(|p| p.tax_id, id)
    }

    pub fn manufacturer_ids(&self) -> Vec<EntityId> {
        self.referenced_ids(|p| p.manufacturer_id)
    }

    pub fn filter_by_manufacturer_id(&self, id: EntityId) -> Self {
        self.filter_by_reference(|p| p.manufacturer_id, id)
    }

    pub fn unit_ids(&self) -> Vec<EntityId> {
        self.referenced_ids(|p| p.unit_id)
    }

    pub fn filter_by_unit_id(&self, id: EntityId) -> Self {
        self.filter_by_reference(|p| p.unit_id, id)
    }

    pub fn price_group_ids(&self) -> Vec<EntityId> {
        self.referenced_ids(|p| p.price_group_id)
    }

    pub fn filter_by_price_group_id(&self, id: EntityId) -> Self {
        self.filter_by_reference(|p| p.price_group_id, id)
    }
}

// ── order ───────────────────────────────────────────────────────

pub struct OrderDeliveryPositionDefinition;

impl EntityDefinition for OrderDeliveryPositionDefinition {
    const ENTITY_TYPE: &'static str = "order_delivery_position";
    type Basic = OrderDeliveryPositionBasic;
    type Detail = OrderDeliveryPositionBasic;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderDeliveryPositionBasic {
    pub id: EntityId,
    pub order_delivery_id: EntityId,
    pub order_line_item_id: EntityId,
    pub unit_price: f64,
    pub total_price: f64,
    pub quantity: i64,
}

impl Collection<OrderDeliveryPositionBasic> {
    pub fn order_delivery_ids(&self) -> Vec<EntityId> {
        self.referenced_ids(|p| Some(p.order_delivery_id))
    }

    pub fn filter_by_order_delivery_id(&self, id: EntityId) -> Self {
        self.filter_by_reference(|p| Some(p.order_delivery_id), id)
    }

    pub fn total_quantity(&self) -> i64 {
        self.iter().map(|p| p.quantity).sum()
    }
}
