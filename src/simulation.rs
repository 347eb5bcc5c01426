use chrono::Utc;
use tracing::{error, info};

use crate::classifier::{Classifier, ClassifierAdapter};
use crate::config::{DelaySampler, SimulationConfig};
use crate::display::DisplayDriver;
use crate::errors::Result;
use crate::generator::BookingSource;
use crate::history::RollingHistory;
use crate::identity::IdentityGenerator;
use crate::models::PredictionEntry;

/// Drives generate → classify → record → render → sleep.
pub struct Simulation<S, C> {
    source: S,
    adapter: ClassifierAdapter<C>,
    identities: Option<IdentityGenerator>,
    history: RollingHistory,
    display: DisplayDriver,
    delays: DelaySampler,
    max_cycles: Option<u64>,
    completed: u64,
}

impl<S: BookingSource, C: Classifier> Simulation<S, C> {
    pub fn new(
        source: S,
        adapter: ClassifierAdapter<C>,
        display: DisplayDriver,
        config: &SimulationConfig,
    ) -> Result<Self> {
        let identities = if config.identities {
            Some(IdentityGenerator::new(config.seed)?)
        } else {
            None
        };

        Ok(Self {
            source,
            adapter,
            identities,
            history: RollingHistory::default(),
            display,
            delays: DelaySampler::new(config.delay, config.seed)?,
            max_cycles: config.max_cycles,
            completed: 0,
        })
    }

    pub fn history(&self) -> &RollingHistory {
        &self.history
    }

    pub fn run_cycle(&mut self) -> Result<PredictionEntry> {
        let record = self.source.generate();
        let probability = self.adapter.score(&record)?;
        let guest = self.identities.as_mut().map(|g| g.next_identity());

        let entry = PredictionEntry::new(self.completed + 1, &record, guest, probability, Utc::now());
        self.completed += 1;
        self.history.append(entry.clone());

        self.display.render_latest(&entry);
        self.display.render_history(&self.history);

        info!(
            sequence = entry.sequence,
            hotel = %entry.hotel,
            probability = entry.cancellation_probability,
            "scored booking"
        );
        Ok(entry)
    }

    fn finished(&self) -> bool {
        self.max_cycles.is_some_and(|max| self.completed >= max)
    }

    /// Runs until the cycle limit, or forever without one. Any cycle error
    /// stops the loop and is returned.
    pub async fn run(&mut self) -> Result<u64> {
        while !self.finished() {
            if let Err(err) = self.run_cycle() {
                error!(error = %err, cycle = self.completed + 1, "simulation halted");
                return Err(err);
            }
            if self.finished() {
                break;
            }
            tokio::time::sleep(self.delays.next_delay()).await;
        }
        Ok(self.completed)
    }
}

/// Scores `count` bookings back to back, without rendering or sleeping.
pub fn score_batch<S: BookingSource, C: Classifier>(
    source: &mut S,
    adapter: &ClassifierAdapter<C>,
    count: usize,
) -> Result<Vec<PredictionEntry>> {
    let mut entries = Vec::with_capacity(count);
    for sequence in 1..=count as u64 {
        let record = source.generate();
        let probability = adapter.score(&record)?;
        entries.push(PredictionEntry::new(sequence, &record, None, probability, Utc::now()));
    }
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::tests::FixedClassifier;
    use crate::classifier::{CategoricalFeature, CategoryWeight, LogisticPipeline, UnknownCategory};
    use crate::config::DelayRange;
    use crate::display::{HistoryFormat, Region};
    use crate::errors::DemoError;
    use crate::models::{minimum_record, BookingRecord, FeatureRow, Hotel};
    use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver};

    struct FixedSource(BookingRecord);

    impl BookingSource for FixedSource {
        fn generate(&mut self) -> BookingRecord {
            self.0.clone()
        }
    }

    /// Hands the model a row with one feature stripped.
    struct WithoutFeature<C> {
        inner: C,
        feature: &'static str,
    }

    impl<C: Classifier> Classifier for WithoutFeature<C> {
        fn predict_probability(&self, row: &FeatureRow) -> Result<f64> {
            let mut row = row.clone();
            row.remove(self.feature);
            self.inner.predict_probability(&row)
        }
    }

    fn city_record() -> BookingRecord {
        let mut record = minimum_record();
        record.hotel = Hotel::City;
        record.adults = 2;
        record
    }

    fn no_delay(max_cycles: Option<u64>) -> SimulationConfig {
        SimulationConfig {
            delay: DelayRange {
                min_secs: 0,
                max_secs: 0,
            },
            max_cycles,
            identities: false,
            seed: Some(1),
        }
    }

    fn simulation<C: Classifier>(
        model: C,
        config: &SimulationConfig,
    ) -> (Simulation<FixedSource, C>, UnboundedReceiver<crate::display::RegionUpdate>) {
        let (tx, rx) = unbounded_channel();
        let display = DisplayDriver::new(tx, true, HistoryFormat::Table);
        let sim = Simulation::new(
            FixedSource(city_record()),
            ClassifierAdapter::new(model),
            display,
            config,
        )
        .unwrap();
        (sim, rx)
    }

    #[test]
    fn fixed_booking_is_scored_and_recorded() {
        let (mut sim, mut rx) = simulation(FixedClassifier(0.7321), &no_delay(None));
        let entry = sim.run_cycle().unwrap();

        assert_eq!(entry.cancellation_probability, 0.7321);
        assert_eq!(entry.hotel.as_str(), "City Hotel");
        assert_eq!(entry.adults, 2);
        assert_eq!(sim.history().len(), 1);

        assert_eq!(rx.try_recv().unwrap().region, Region::Latest);
        let history = rx.try_recv().unwrap();
        assert_eq!(history.region, Region::History);
        assert!(history.content.contains("0.7321"));
    }

    #[test]
    fn missing_hotel_feature_is_fatal() {
        let strict = LogisticPipeline {
            numeric: Vec::new(),
            categorical: vec![CategoricalFeature {
                name: "hotel".to_string(),
                handle_unknown: UnknownCategory::Error,
                categories: vec![CategoryWeight {
                    value: "City Hotel".to_string(),
                    coef: 0.3,
                }],
            }],
            intercept: 0.0,
        };
        let model = WithoutFeature {
            inner: strict,
            feature: "hotel",
        };
        let (mut sim, mut rx) = simulation(model, &no_delay(None));

        let err = sim.run_cycle().unwrap_err();
        assert!(matches!(err, DemoError::SchemaMismatch(_)));
        assert!(sim.history().is_empty());
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn run_stops_at_cycle_limit_keeping_last_ten() {
        let (mut sim, _rx) = simulation(FixedClassifier(0.25), &no_delay(Some(12)));
        let completed = sim.run().await.unwrap();

        assert_eq!(completed, 12);
        let sequences: Vec<u64> = sim.history().iter().map(|e| e.sequence).collect();
        assert_eq!(sequences, (3..=12).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn run_propagates_classifier_failure() {
        let (mut sim, _rx) = simulation(FixedClassifier(-0.5), &no_delay(Some(3)));
        let err = sim.run().await.unwrap_err();
        assert!(matches!(err, DemoError::InvalidProbability(_)));
        assert!(sim.history().is_empty());
    }

    #[test]
    fn batch_scores_requested_count() {
        let mut source = FixedSource(city_record());
        let adapter = ClassifierAdapter::new(FixedClassifier(0.12346));
        let entries = score_batch(&mut source, &adapter, 4).unwrap();
        assert_eq!(entries.len(), 4);
        assert_eq!(entries[3].sequence, 4);
        assert!(entries.iter().all(|e| e.cancellation_probability == 0.1235));
    }

    #[test]
    fn identities_attach_to_entries_when_enabled() {
        let mut config = no_delay(None);
        config.identities = true;
        let (mut sim, _rx) = simulation(FixedClassifier(0.1), &config);
        let entry = sim.run_cycle().unwrap();
        assert!(entry.guest.is_some());
    }
}
