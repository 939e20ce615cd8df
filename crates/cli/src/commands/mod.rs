//! CLI Commands

pub mod auth;
pub mod normalize;
pub mod record;

use clap::ValueEnum;

use auxsync_drivers::Entity;

/// Record types managed by auxsync
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum EntityArg {
    BusinessRelation,
    Customer,
    ShipToAddress,
    Supplier,
    Salesperson,
}

impl From<EntityArg> for Entity {
    fn from(arg: EntityArg) -> Self {
        match arg {
            EntityArg::BusinessRelation => Entity::BusinessRelation,
            EntityArg::Customer => Entity::Customer,
            EntityArg::ShipToAddress => Entity::ShipToAddress,
            EntityArg::Supplier => Entity::Supplier,
            EntityArg::Salesperson => Entity::Salesperson,
        }
    }
}
