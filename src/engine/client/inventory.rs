//! Consolidated object listing across resource kinds.

use futures_util::future::try_join_all;
use serde_json::Value;
use tracing::debug;

use super::DockerCli;
use crate::engine::invoker::ProcessInvoker;
use crate::engine::retry::Deadline;
use crate::error::CommandError;

/// Kinds of object included in an [`Inventory`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    /// Containers, running or not.
    Container,
    /// Images.
    Image,
    /// Networks.
    Network,
    /// Volumes.
    Volume,
}

impl ObjectKind {
    /// Every kind, in listing order.
    pub const ALL: [Self; 4] = [Self::Container, Self::Image, Self::Network, Self::Volume];

    /// The engine's management command for this kind.
    #[must_use]
    pub const fn command(self) -> &'static str {
        match self {
            Self::Container => "container",
            Self::Image => "image",
            Self::Network => "network",
            Self::Volume => "volume",
        }
    }

    const fn extra_args(self) -> &'static [&'static str] {
        match self {
            Self::Container => &["--all", "--no-trunc"],
            Self::Image | Self::Network => &["--no-trunc"],
            Self::Volume => &[],
        }
    }

    const fn name_field(self) -> &'static str {
        match self {
            Self::Container => "Names",
            Self::Image => "Repository",
            Self::Network | Self::Volume => "Name",
        }
    }
}

/// One listed object.
#[derive(Debug, Clone, PartialEq)]
pub struct InventoryItem {
    /// The object's kind.
    pub kind: ObjectKind,
    /// Object id; volumes, which have none, use their name.
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// The complete listing row.
    pub raw: Value,
}

impl InventoryItem {
    fn from_row(kind: ObjectKind, raw: Value) -> Self {
        let field = |key: &str| {
            raw.get(key)
                .and_then(Value::as_str)
                .map(String::from)
                .unwrap_or_default()
        };
        let name = field(kind.name_field());
        let id = match field("ID") {
            id if id.is_empty() => name.clone(),
            id => id,
        };
        Self {
            kind,
            id,
            name,
            raw,
        }
    }
}

/// Objects of every kind matching a filter.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Inventory {
    /// Matching containers.
    pub containers: Vec<InventoryItem>,
    /// Matching images.
    pub images: Vec<InventoryItem>,
    /// Matching networks.
    pub networks: Vec<InventoryItem>,
    /// Matching volumes.
    pub volumes: Vec<InventoryItem>,
}

impl Inventory {
    /// Total number of objects.
    #[must_use]
    pub fn len(&self) -> usize {
        self.containers.len() + self.images.len() + self.networks.len() + self.volumes.len()
    }

    /// Whether nothing matched.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every object, kind by kind.
    pub fn iter(&self) -> impl Iterator<Item = &InventoryItem> {
        self.containers
            .iter()
            .chain(&self.images)
            .chain(&self.networks)
            .chain(&self.volumes)
    }
}

impl<I> DockerCli<I>
where
    I: ProcessInvoker + Sync,
{
    /// List every object matching `filters` (`key=value`) across all kinds.
    ///
    /// One listing per kind runs concurrently. The join is all-or-nothing:
    /// the first failure cancels the remaining listings and is returned.
    ///
    /// # Errors
    ///
    /// Returns the first error raised by any listing.
    pub async fn inventory(
        &self,
        filters: &[String],
        deadline: Option<Deadline>,
    ) -> Result<Inventory, CommandError> {
        let listings = try_join_all(
            ObjectKind::ALL
                .iter()
                .map(|kind| self.list_kind(*kind, filters, deadline)),
        )
        .await?;

        let mut inventory = Inventory::default();
        for (kind, items) in ObjectKind::ALL.iter().zip(listings) {
            let slot = match kind {
                ObjectKind::Container => &mut inventory.containers,
                ObjectKind::Image => &mut inventory.images,
                ObjectKind::Network => &mut inventory.networks,
                ObjectKind::Volume => &mut inventory.volumes,
            };
            *slot = items;
        }
        debug!(objects = inventory.len(), "inventory collected");
        Ok(inventory)
    }

    async fn list_kind(
        &self,
        kind: ObjectKind,
        filters: &[String],
        deadline: Option<Deadline>,
    ) -> Result<Vec<InventoryItem>, CommandError> {
        let mut args = vec![String::from(kind.command()), String::from("ls")];
        args.extend(kind.extra_args().iter().map(|arg| String::from(*arg)));
        for filter in filters {
            args.push(String::from("--filter"));
            args.push(filter.clone());
        }
        args.push(String::from("--format"));
        args.push(String::from("{{json .}}"));

        let request = self.request(args);
        let rows: Vec<Value> = self
            .run_json(
                &format!("listing {}s", kind.command()),
                &request,
                &self.tables.none,
                deadline,
            )
            .await?;
        Ok(rows
            .into_iter()
            .map(|row| InventoryItem::from_row(kind, row))
            .collect())
    }
}
