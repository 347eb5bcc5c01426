use rand::rngs::{OsRng, StdRng};
use rand::{Rng, SeedableRng};
use tracing::debug;

use crate::errors::{DemoError, Result};
use crate::models::{
    BookingRecord, CustomerType, DepositType, DistributionChannel, Hotel, MarketSegment, Meal,
    RoomType,
};

/// Something that can produce the next incoming booking.
pub trait BookingSource {
    fn generate(&mut self) -> BookingRecord;
}

/// Chance that `company` / `agent` carry an id instead of 0.
const ID_PRESENT_PROBABILITY: f64 = 0.8;

pub struct RandomBookingGenerator {
    rng: StdRng,
}

impl RandomBookingGenerator {
    /// Seeded for reproducible runs, otherwise from OS entropy.
    pub fn new(seed: Option<u64>) -> Result<Self> {
        Ok(Self {
            rng: seeded_rng(seed)?,
        })
    }

    fn pick<T: Copy>(&mut self, values: &[T]) -> T {
        values[self.rng.gen_range(0..values.len())]
    }

    fn optional_id(&mut self) -> f64 {
        if self.rng.gen_bool(ID_PRESENT_PROBABILITY) {
            self.rng.gen_range(0..500) as f64
        } else {
            0.0
        }
    }
}

impl BookingSource for RandomBookingGenerator {
    fn generate(&mut self) -> BookingRecord {
        let adr: f64 = self.rng.gen_range(50.0..200.0);
        let record = BookingRecord {
            lead_time: self.rng.gen_range(0..365),
            // The model was fitted on whole-currency rates.
            adr: adr.trunc(),
            previous_cancellations: self.rng.gen_range(0..5),
            previous_bookings_not_canceled: self.rng.gen_range(0..10),
            booking_changes: self.rng.gen_range(0..5),
            days_in_waiting_list: self.rng.gen_range(0..30),
            adults: self.rng.gen_range(1..3),
            required_car_parking_spaces: self.rng.gen_range(0..2),
            total_of_special_requests: self.rng.gen_range(0..5),
            company: self.optional_id(),
            agent: self.optional_id(),
            hotel: self.pick(Hotel::ALL),
            customer_type: self.pick(CustomerType::ALL),
            market_segment: self.pick(MarketSegment::ALL),
            distribution_channel: self.pick(DistributionChannel::ALL),
            deposit_type: self.pick(DepositType::ALL),
            meal: self.pick(Meal::ALL),
            reserved_room_type: self.pick(RoomType::ALL),
            assigned_room_type: self.pick(RoomType::ALL),
            is_repeated_guest: self.rng.gen_range(0..2),
        };
        debug!(hotel = %record.hotel, lead_time = record.lead_time, "generated booking");
        record
    }
}

pub fn seeded_rng(seed: Option<u64>) -> Result<StdRng> {
    match seed {
        Some(seed) => Ok(StdRng::seed_from_u64(seed)),
        None => StdRng::from_rng(OsRng).map_err(|err| DemoError::RandomSource(err.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_fields_stay_in_range() {
        let mut generator = RandomBookingGenerator::new(Some(17)).unwrap();
        for _ in 0..2_000 {
            let record = generator.generate();
            assert!(record.lead_time < 365);
            assert!((50.0..200.0).contains(&record.adr));
            assert_eq!(record.adr, record.adr.trunc());
            assert!(record.previous_cancellations < 5);
            assert!(record.previous_bookings_not_canceled < 10);
            assert!(record.booking_changes < 5);
            assert!(record.days_in_waiting_list < 30);
            assert!((1..3).contains(&record.adults));
            assert!(record.required_car_parking_spaces < 2);
            assert!(record.total_of_special_requests < 5);
            assert!(record.is_repeated_guest <= 1);
            for id in [record.company, record.agent] {
                assert!((0.0..500.0).contains(&id));
                assert_eq!(id, id.trunc());
            }
            assert!(RoomType::ALL.contains(&record.assigned_room_type));
            assert!(Hotel::ALL.contains(&record.hotel));
        }
    }

    #[test]
    fn every_category_eventually_appears() {
        let mut generator = RandomBookingGenerator::new(Some(3)).unwrap();
        let records: Vec<BookingRecord> = (0..2_000).map(|_| generator.generate()).collect();
        for segment in MarketSegment::ALL {
            assert!(records.iter().any(|r| r.market_segment == *segment));
        }
        for room in RoomType::ALL {
            assert!(records.iter().any(|r| r.reserved_room_type == *room));
        }
        assert!(records.iter().any(|r| r.company == 0.0));
        assert!(records.iter().any(|r| r.agent > 0.0));
    }

    #[test]
    fn same_seed_yields_same_sequence() {
        let mut first = RandomBookingGenerator::new(Some(99)).unwrap();
        let mut second = RandomBookingGenerator::new(Some(99)).unwrap();
        for _ in 0..20 {
            assert_eq!(first.generate(), second.generate());
        }
    }

    #[test]
    fn unseeded_generator_uses_os_entropy() {
        assert!(RandomBookingGenerator::new(None).is_ok());
    }
}
