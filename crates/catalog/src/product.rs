use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use tempora_core::{Aggregate, AggregateRoot, ProductId};
use tempora_events::Event;

use crate::error::{CatalogError, CatalogResult};
use crate::version::ProductVersion;

/// Aggregate root: Product.
///
/// Owns its versions exclusively. Invariant: no two versions have overlapping
/// date ranges. Every state change goes through `handle` + `apply`, and the
/// public mutators return a new `Product` instead of editing `self`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Product {
    id: ProductId,
    code: String,
    overview: String,
    is_confidential: bool,
    versions: Vec<ProductVersion>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    revision: u64,
    created: bool,
    pending_events: Vec<CatalogEvent>,
}

impl Product {
    /// Create an empty, not-yet-created aggregate instance.
    pub fn empty(id: ProductId) -> Self {
        Self {
            id,
            code: String::new(),
            overview: String::new(),
            is_confidential: false,
            versions: Vec::new(),
            created_at: DateTime::<Utc>::default(),
            updated_at: DateTime::<Utc>::default(),
            revision: 0,
            created: false,
            pending_events: Vec::new(),
        }
    }

    /// Factory: a product with zero versions.
    pub fn create(
        id: ProductId,
        code: impl Into<String>,
        overview: impl Into<String>,
        is_confidential: bool,
        at: DateTime<Utc>,
    ) -> CatalogResult<Self> {
        let command = ProductCommand::CreateProduct(CreateProduct {
            product_id: id,
            code: code.into(),
            overview: overview.into(),
            is_confidential,
            occurred_at: at,
        });
        Self::empty(id).evolve(&command)
    }

    /// Append `candidate`, or reject it without touching `self`.
    ///
    /// Fails with [`CatalogError::OverlappingDateRange`] naming the first
    /// existing version whose range intersects the candidate's.
    pub fn add_version(&self, candidate: ProductVersion, at: DateTime<Utc>) -> CatalogResult<Self> {
        let command = ProductCommand::AddVersion(AddVersion {
            product_id: self.id,
            version: candidate,
            occurred_at: at,
        });
        self.evolve(&command)
    }

    /// The version whose range contains `date`, if any.
    ///
    /// Two matches can only come from stored state that bypassed
    /// `add_version`; that is reported instead of picking one.
    pub fn get_version_for_date(&self, date: NaiveDate) -> CatalogResult<Option<&ProductVersion>> {
        let mut matches = self.versions.iter().filter(|v| v.date_range().contains(date));
        let first = matches.next();

        if let (Some(first), Some(second)) = (first, matches.next()) {
            return Err(CatalogError::BusinessRuleViolation(format!(
                "product {}: versions {} {} and {} {} both cover {date}",
                self.code,
                first.label(),
                first.date_range(),
                second.label(),
                second.date_range(),
            )));
        }

        Ok(first)
    }

    /// Verify the aggregate invariants on (possibly rehydrated) state.
    pub fn check_invariants(&self) -> CatalogResult<()> {
        if !self.created {
            return Err(CatalogError::BusinessRuleViolation(format!(
                "product {} was never created",
                self.id
            )));
        }
        if self.code.trim().is_empty() {
            return Err(CatalogError::BusinessRuleViolation(format!(
                "product {} has a blank code",
                self.id
            )));
        }

        for (idx, a) in self.versions.iter().enumerate() {
            for b in &self.versions[idx + 1..] {
                if a.id_typed() == b.id_typed() {
                    return Err(CatalogError::BusinessRuleViolation(format!(
                        "product {}: version id {} appears twice",
                        self.code,
                        a.id_typed()
                    )));
                }
                if a.date_range().overlaps(b.date_range()) {
                    return Err(CatalogError::BusinessRuleViolation(format!(
                        "product {}: ranges {} and {} overlap",
                        self.code,
                        a.date_range(),
                        b.date_range()
                    )));
                }
            }

            let fields = a.fields();
            for (fidx, field) in fields.iter().enumerate() {
                if fields[fidx + 1..].iter().any(|f| f.name() == field.name()) {
                    return Err(CatalogError::BusinessRuleViolation(format!(
                        "product {}: version {} repeats field {}",
                        self.code,
                        a.label(),
                        field.name()
                    )));
                }
            }
        }
        Ok(())
    }

    pub fn id_typed(&self) -> ProductId {
        self.id
    }

    /// False only for [`Product::empty`] instances no creation event was applied to.
    pub fn is_created(&self) -> bool {
        self.created
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn overview(&self) -> &str {
        &self.overview
    }

    pub fn is_confidential(&self) -> bool {
        self.is_confidential
    }

    pub fn versions(&self) -> &[ProductVersion] {
        &self.versions
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Events produced since the aggregate was last persisted.
    pub fn pending_events(&self) -> &[CatalogEvent] {
        &self.pending_events
    }

    /// Drain pending events (persistence calls this after a successful write).
    pub fn take_pending_events(&mut self) -> Vec<CatalogEvent> {
        std::mem::take(&mut self.pending_events)
    }

    pub fn to_snapshot(&self) -> ProductSnapshot {
        ProductSnapshot {
            id: self.id,
            code: self.code.clone(),
            overview: self.overview.clone(),
            is_confidential: self.is_confidential,
            versions: self.versions.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
            revision: self.revision,
        }
    }

    /// Rehydrate stored state as-is. Use [`Product::check_invariants`] when
    /// the source is not trusted.
    pub fn from_snapshot(snapshot: ProductSnapshot) -> Self {
        Self {
            id: snapshot.id,
            code: snapshot.code,
            overview: snapshot.overview,
            is_confidential: snapshot.is_confidential,
            versions: snapshot.versions,
            created_at: snapshot.created_at,
            updated_at: snapshot.updated_at,
            revision: snapshot.revision,
            created: true,
            pending_events: Vec::new(),
        }
    }

    fn evolve(&self, command: &ProductCommand) -> CatalogResult<Self> {
        let events = self.handle(command)?;

        let mut next = self.clone();
        for event in events {
            next.apply(&event);
            next.pending_events.push(event);
        }

        debug_assert!(
            next.check_invariants().is_ok(),
            "product {} left inconsistent by {command:?}",
            next.code
        );
        Ok(next)
    }
}

impl AggregateRoot for Product {
    type Id = ProductId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn revision(&self) -> u64 {
        self.revision
    }
}

/// Whole-aggregate persistence form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductSnapshot {
    pub id: ProductId,
    pub code: String,
    pub overview: String,
    pub is_confidential: bool,
    pub versions: Vec<ProductVersion>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub revision: u64,
}

/// Command: CreateProduct.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateProduct {
    pub product_id: ProductId,
    pub code: String,
    pub overview: String,
    pub is_confidential: bool,
    pub occurred_at: DateTime<Utc>,
}

/// Command: AddVersion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddVersion {
    pub product_id: ProductId,
    pub version: ProductVersion,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProductCommand {
    CreateProduct(CreateProduct),
    AddVersion(AddVersion),
}

/// Event: ProductCreated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductCreated {
    pub product_id: ProductId,
    pub code: String,
    pub overview: String,
    pub is_confidential: bool,
    pub occurred_at: DateTime<Utc>,
}

/// Event: VersionAdded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionAdded {
    pub product_id: ProductId,
    pub version: ProductVersion,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CatalogEvent {
    ProductCreated(ProductCreated),
    VersionAdded(VersionAdded),
}

impl Event for CatalogEvent {
    type AggregateId = ProductId;

    fn event_type(&self) -> &'static str {
        match self {
            CatalogEvent::ProductCreated(_) => "catalog.product.created",
            CatalogEvent::VersionAdded(_) => "catalog.product.version_added",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn aggregate_id(&self) -> ProductId {
        match self {
            CatalogEvent::ProductCreated(e) => e.product_id,
            CatalogEvent::VersionAdded(e) => e.product_id,
        }
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            CatalogEvent::ProductCreated(e) => e.occurred_at,
            CatalogEvent::VersionAdded(e) => e.occurred_at,
        }
    }
}

impl Aggregate for Product {
    type Command = ProductCommand;
    type Event = CatalogEvent;
    type Error = CatalogError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            CatalogEvent::ProductCreated(e) => {
                self.id = e.product_id;
                self.code = e.code.clone();
                self.overview = e.overview.clone();
                self.is_confidential = e.is_confidential;
                self.created_at = e.occurred_at;
                self.updated_at = e.occurred_at;
                self.created = true;
            }
            CatalogEvent::VersionAdded(e) => {
                self.versions.push(e.version.clone());
                self.updated_at = e.occurred_at;
            }
        }

        self.revision += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            ProductCommand::CreateProduct(cmd) => self.handle_create(cmd),
            ProductCommand::AddVersion(cmd) => self.handle_add_version(cmd),
        }
    }
}

impl Product {
    fn ensure_product_id(&self, product_id: ProductId) -> CatalogResult<()> {
        if self.id != product_id {
            return Err(CatalogError::BusinessRuleViolation(format!(
                "command for product {product_id} sent to product {}",
                self.id
            )));
        }
        Ok(())
    }

    fn handle_create(&self, cmd: &CreateProduct) -> CatalogResult<Vec<CatalogEvent>> {
        if self.created {
            return Err(CatalogError::BusinessRuleViolation(format!(
                "product {} already exists",
                self.code
            )));
        }
        self.ensure_product_id(cmd.product_id)?;

        if cmd.code.trim().is_empty() {
            return Err(CatalogError::validation("product code cannot be empty"));
        }

        // Code uniqueness across products is the repository's job.

        Ok(vec![CatalogEvent::ProductCreated(ProductCreated {
            product_id: cmd.product_id,
            code: cmd.code.clone(),
            overview: cmd.overview.clone(),
            is_confidential: cmd.is_confidential,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_add_version(&self, cmd: &AddVersion) -> CatalogResult<Vec<CatalogEvent>> {
        if !self.created {
            return Err(CatalogError::product_not_found_by_id(cmd.product_id));
        }
        self.ensure_product_id(cmd.product_id)?;

        let candidate = &cmd.version;
        if self.versions.iter().any(|v| v.id_typed() == candidate.id_typed()) {
            return Err(CatalogError::validation(format!(
                "product {}: version id {} already present",
                self.code,
                candidate.id_typed()
            )));
        }

        if let Some(existing) = self
            .versions
            .iter()
            .find(|v| v.date_range().overlaps(candidate.date_range()))
        {
            return Err(CatalogError::OverlappingDateRange {
                product_code: self.code.clone(),
                candidate: *candidate.date_range(),
                existing: *existing.date_range(),
            });
        }

        Ok(vec![CatalogEvent::VersionAdded(VersionAdded {
            product_id: cmd.product_id,
            version: candidate.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::date_range::DateRange;
    use crate::field::{CatalogField, FieldClassification};
    use chrono::TimeZone;
    use tempora_core::{FieldId, VersionId};

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn t(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, hour, 0, 0).unwrap()
    }

    fn version(label: &str, range: DateRange, field_names: &[&str]) -> ProductVersion {
        let fields = field_names
            .iter()
            .map(|n| CatalogField::new(FieldId::new(), *n, FieldClassification::Required, "string").unwrap())
            .collect();
        ProductVersion::new(VersionId::new(), label, range, fields).unwrap()
    }

    fn v1() -> ProductVersion {
        version(
            "V1",
            DateRange::bounded(d(2024, 1, 1), d(2024, 6, 30)).unwrap(),
            &["iban", "holder"],
        )
    }

    fn v2() -> ProductVersion {
        version("V2", DateRange::open(d(2024, 7, 1)), &["iban", "holder", "bic"])
    }

    fn banking_data() -> Product {
        Product::create(ProductId::new(), "BANKING_DATA", "Bank account details", true, t(0)).unwrap()
    }

    #[test]
    fn create_starts_with_zero_versions() {
        let product = banking_data();
        assert_eq!(product.code(), "BANKING_DATA");
        assert!(product.is_confidential());
        assert!(product.versions().is_empty());
        assert_eq!(product.created_at(), t(0));
        assert_eq!(product.updated_at(), t(0));
        assert_eq!(product.revision(), 1);
        assert_eq!(product.pending_events().len(), 1);
        assert!(product.is_created());
        assert!(product.check_invariants().is_ok());
    }

    #[test]
    fn empty_or_blank_code_state_breaks_invariants() {
        let empty = Product::empty(ProductId::new());
        assert!(!empty.is_created());
        assert!(matches!(
            empty.check_invariants(),
            Err(CatalogError::BusinessRuleViolation(_))
        ));

        let mut snapshot = banking_data().to_snapshot();
        snapshot.code = "  ".to_string();
        assert!(matches!(
            Product::from_snapshot(snapshot).check_invariants(),
            Err(CatalogError::BusinessRuleViolation(_))
        ));
    }

    #[test]
    fn create_rejects_blank_code() {
        let err = Product::create(ProductId::new(), "   ", "", false, t(0)).unwrap_err();
        assert!(matches!(err, CatalogError::Validation(_)));
    }

    #[test]
    fn scenario_a_append_then_reject_overlap() {
        let product = banking_data().add_version(v1(), t(1)).unwrap();
        let product = product.add_version(v2(), t(2)).unwrap();
        assert_eq!(product.versions().len(), 2);
        assert_eq!(product.updated_at(), t(2));

        let v3 = version(
            "V3",
            DateRange::bounded(d(2024, 5, 1), d(2024, 8, 1)).unwrap(),
            &["iban"],
        );
        let err = product.add_version(v3, t(3)).unwrap_err();
        match err {
            CatalogError::OverlappingDateRange {
                product_code,
                existing,
                ..
            } => {
                assert_eq!(product_code, "BANKING_DATA");
                assert_eq!(existing, *v1().date_range());
            }
            other => panic!("expected OverlappingDateRange, got {other:?}"),
        }
        assert_eq!(product.versions().len(), 2);
    }

    #[test]
    fn rejected_add_leaves_aggregate_unchanged() {
        let product = banking_data().add_version(v2(), t(1)).unwrap();
        let before = product.clone();

        let second_open = version("V2b", DateRange::open(d(2030, 1, 1)), &["iban"]);
        assert!(product.add_version(second_open, t(2)).is_err());
        assert_eq!(product, before);
    }

    #[test]
    fn open_ended_version_matches_far_future() {
        let product = banking_data().add_version(v2(), t(1)).unwrap();
        let found = product.get_version_for_date(d(2999, 1, 1)).unwrap().unwrap();
        assert_eq!(found.label(), "V2");
        assert!(product.get_version_for_date(d(2024, 6, 30)).unwrap().is_none());
    }

    #[test]
    fn earlier_bounded_version_fits_before_open_one() {
        let product = banking_data().add_version(v2(), t(1)).unwrap();
        let product = product.add_version(v1(), t(2)).unwrap();
        assert_eq!(
            product.get_version_for_date(d(2024, 3, 15)).unwrap().map(|v| v.label()),
            Some("V1")
        );
    }

    #[test]
    fn boundaries_are_inclusive() {
        let product = banking_data().add_version(v1(), t(1)).unwrap();
        for (date, expected) in [
            (d(2024, 1, 1), true),
            (d(2024, 6, 30), true),
            (d(2023, 12, 31), false),
            (d(2024, 7, 1), false),
        ] {
            assert_eq!(product.get_version_for_date(date).unwrap().is_some(), expected, "{date}");
        }
    }

    #[test]
    fn duplicate_version_id_is_rejected() {
        let first = v1();
        let product = banking_data().add_version(first.clone(), t(1)).unwrap();

        let reused = ProductVersion::new(first.id_typed(), "again", DateRange::open(d(2025, 1, 1)), vec![])
            .unwrap();
        assert!(matches!(product.add_version(reused, t(2)), Err(CatalogError::Validation(_))));
    }

    #[test]
    fn add_version_to_uncreated_product_is_not_found() {
        let err = Product::empty(ProductId::new()).add_version(v1(), t(1)).unwrap_err();
        assert!(matches!(err, CatalogError::ProductNotFound(_)));
    }

    #[test]
    fn each_change_bumps_revision_and_records_an_event() {
        let mut product = banking_data();
        product.take_pending_events();

        let product = product.add_version(v1(), t(1)).unwrap();
        assert_eq!(product.revision(), 2);

        let events = product.pending_events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type(), "catalog.product.version_added");
        assert_eq!(events[0].aggregate_id(), product.id_typed());
        assert_eq!(events[0].occurred_at(), t(1));
    }

    #[test]
    fn handle_does_not_mutate_state() {
        let product = banking_data();
        let before = product.clone();

        let command = ProductCommand::AddVersion(AddVersion {
            product_id: product.id_typed(),
            version: v1(),
            occurred_at: t(1),
        });
        let events1 = product.handle(&command).unwrap();
        let events2 = product.handle(&command).unwrap();

        assert_eq!(product, before);
        assert_eq!(events1, events2);
    }

    #[test]
    fn command_for_another_product_is_rejected() {
        let product = banking_data();
        let command = ProductCommand::AddVersion(AddVersion {
            product_id: ProductId::new(),
            version: v1(),
            occurred_at: t(1),
        });
        assert!(matches!(
            product.handle(&command),
            Err(CatalogError::BusinessRuleViolation(_))
        ));
    }

    #[test]
    fn snapshot_round_trip_preserves_state() {
        let product = banking_data().add_version(v1(), t(1)).unwrap();
        let restored = Product::from_snapshot(product.to_snapshot());

        assert_eq!(restored.to_snapshot(), product.to_snapshot());
        assert!(restored.pending_events().is_empty());
        assert_eq!(restored.revision(), product.revision());
    }

    #[test]
    fn corrupted_snapshot_is_reported_not_resolved() {
        let mut snapshot = banking_data().to_snapshot();
        snapshot.versions = vec![
            v1(),
            version("V1-dup", DateRange::bounded(d(2024, 3, 1), d(2024, 3, 31)).unwrap(), &["iban"]),
        ];
        let product = Product::from_snapshot(snapshot);

        assert!(matches!(
            product.check_invariants(),
            Err(CatalogError::BusinessRuleViolation(_))
        ));
        assert!(matches!(
            product.get_version_for_date(d(2024, 3, 15)),
            Err(CatalogError::BusinessRuleViolation(_))
        ));
        // Dates covered by a single version still resolve.
        assert_eq!(
            product.get_version_for_date(d(2024, 1, 15)).unwrap().map(|v| v.label()),
            Some("V1")
        );
    }

    #[cfg(test)]
    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        fn arb_range() -> impl Strategy<Value = DateRange> {
            (0i64..730, proptest::option::of(0i64..120)).prop_map(|(offset, len)| {
                let start = d(2024, 1, 1) + chrono::Duration::days(offset);
                match len {
                    Some(len) => DateRange::bounded(start, start + chrono::Duration::days(len)).unwrap(),
                    None => DateRange::open(start),
                }
            })
        }

        proptest! {
            #![proptest_config(ProptestConfig {
                cases: 300,
                ..ProptestConfig::default()
            })]

            /// Property: whatever sequence is attempted, accepted versions never overlap.
            #[test]
            fn accepted_versions_never_overlap(ranges in proptest::collection::vec(arb_range(), 1..12)) {
                let mut product = banking_data();
                for (idx, range) in ranges.iter().enumerate() {
                    let candidate = version(&format!("V{idx}"), *range, &["iban"]);
                    let overlaps_existing = product
                        .versions()
                        .iter()
                        .any(|v| v.date_range().overlaps(range));

                    match product.add_version(candidate, t(1)) {
                        Ok(next) => {
                            prop_assert!(!overlaps_existing);
                            product = next;
                        }
                        Err(CatalogError::OverlappingDateRange { .. }) => prop_assert!(overlaps_existing),
                        Err(other) => prop_assert!(false, "unexpected error {other:?}"),
                    }
                }
                prop_assert!(product.check_invariants().is_ok());
            }

            /// Property: a date inside an accepted version's range resolves to that version.
            #[test]
            fn contained_date_resolves_to_owning_version(
                ranges in proptest::collection::vec(arb_range(), 1..12),
                probe in 0i64..900,
            ) {
                let mut product = banking_data();
                for (idx, range) in ranges.iter().enumerate() {
                    if let Ok(next) = product.add_version(version(&format!("V{idx}"), *range, &[]), t(1)) {
                        product = next;
                    }
                }

                let date = d(2024, 1, 1) + chrono::Duration::days(probe);
                let owner = product.versions().iter().find(|v| v.date_range().contains(date));
                let resolved = product.get_version_for_date(date).unwrap();
                prop_assert_eq!(resolved.map(|v| v.id_typed()), owner.map(|v| v.id_typed()));
            }
        }
    }
}
