use super::domain::{ClientRecord, EmptySelectionPolicy, RegionSelection};

/// Result of restricting the client list to the operator's regions.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterOutcome {
    /// The selection is empty and the policy requires an explicit choice.
    AwaitingSelection,
    /// Nothing in the dataset matches the selection.
    NoMatches,
    /// Non-empty subset, in source order.
    Matched(Vec<ClientRecord>),
}

pub fn filter_by_regions(
    records: &[ClientRecord],
    selection: &RegionSelection,
    policy: EmptySelectionPolicy,
) -> FilterOutcome {
    let matched: Vec<ClientRecord> = if selection.is_empty() {
        match policy {
            EmptySelectionPolicy::RequireSelection => return FilterOutcome::AwaitingSelection,
            EmptySelectionPolicy::ShowAll => records.to_vec(),
        }
    } else {
        records
            .iter()
            .filter(|record| {
                record
                    .region
                    .as_deref()
                    .is_some_and(|region| selection.contains(region))
            })
            .cloned()
            .collect()
    };

    if matched.is_empty() {
        FilterOutcome::NoMatches
    } else {
        FilterOutcome::Matched(matched)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(row: usize, region: Option<&str>) -> ClientRecord {
        ClientRecord {
            row,
            name: format!("Client {row}"),
            address: Some(format!("{row} Rue X")),
            region: region.map(str::to_string),
            coordinate: None,
        }
    }

    fn sample() -> Vec<ClientRecord> {
        vec![
            record(0, Some("Paris")),
            record(1, Some("Nord")),
            record(2, None),
            record(3, Some("Gironde")),
            record(4, Some("Paris")),
        ]
    }

    #[test]
    fn output_regions_stay_within_the_selection() {
        let records = sample();
        for labels in [vec!["Paris"], vec!["Nord", "Gironde"], vec!["Paris", "Nord"]] {
            let selection = RegionSelection::new(&labels);
            let FilterOutcome::Matched(matched) = filter_by_regions(
                &records,
                &selection,
                EmptySelectionPolicy::RequireSelection,
            ) else {
                panic!("expected matches for {labels:?}");
            };
            assert!(matched.iter().all(|record| record
                .region
                .as_deref()
                .is_some_and(|region| selection.contains(region))));
        }
    }

    #[test]
    fn keeps_source_order() {
        let selection = RegionSelection::new(["Paris", "Gironde"]);
        let FilterOutcome::Matched(matched) = filter_by_regions(
            &sample(),
            &selection,
            EmptySelectionPolicy::RequireSelection,
        ) else {
            panic!("expected matches");
        };
        let rows: Vec<usize> = matched.iter().map(|record| record.row).collect();
        assert_eq!(rows, vec![0, 3, 4]);
    }

    #[test]
    fn empty_selection_follows_policy() {
        let records = sample();
        let selection = RegionSelection::default();

        assert_eq!(
            filter_by_regions(&records, &selection, EmptySelectionPolicy::RequireSelection),
            FilterOutcome::AwaitingSelection
        );
        assert_eq!(
            filter_by_regions(&records, &selection, EmptySelectionPolicy::ShowAll),
            FilterOutcome::Matched(records.clone())
        );
    }

    #[test]
    fn region_without_clients_is_not_an_error() {
        let selection = RegionSelection::new(["Corse-du-Sud"]);
        assert_eq!(
            filter_by_regions(&sample(), &selection, EmptySelectionPolicy::ShowAll),
            FilterOutcome::NoMatches
        );
        assert_eq!(
            filter_by_regions(&[], &RegionSelection::default(), EmptySelectionPolicy::ShowAll),
            FilterOutcome::NoMatches
        );
    }
}
