use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

macro_rules! categorical {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $label:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
        pub enum $name {
            $(
                #[serde(rename = $label)]
                $variant,
            )+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $label,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

categorical!(Hotel {
    Resort => "Resort Hotel",
    City => "City Hotel",
});

categorical!(CustomerType {
    Contract => "Contract",
    Transient => "Transient",
    Group => "Group",
    TransientParty => "Transient-Party",
});

categorical!(MarketSegment {
    Direct => "Direct",
    Corporate => "Corporate",
    OnlineTa => "Online TA",
    OfflineTaTo => "Offline TA/TO",
    Complementary => "Complementary",
});

categorical!(DistributionChannel {
    Direct => "Direct",
    TaTo => "TA/TO",
    Corporate => "Corporate",
    Gds => "GDS",
});

categorical!(DepositType {
    NoDeposit => "No Deposit",
    NonRefund => "Non Refund",
    Refundable => "Refundable",
});

categorical!(Meal {
    BedAndBreakfast => "BB",
    HalfBoard => "HB",
    FullBoard => "FB",
    SelfCatering => "SC",
});

categorical!(
    /// Room codes as they appear in the booking system; the letters carry no ordering.
    RoomType {
        A => "A",
        B => "B",
        C => "C",
        D => "D",
        E => "E",
        F => "F",
        G => "G",
        H => "H",
        I => "I",
        K => "K",
        L => "L",
        P => "P",
    }
);

/// One synthetic incoming booking. Fields are drawn independently, so
/// combinations such as a mismatched assigned room are expected.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BookingRecord {
    pub lead_time: u32,
    pub adr: f64,
    pub previous_cancellations: u32,
    pub previous_bookings_not_canceled: u32,
    pub booking_changes: u32,
    pub days_in_waiting_list: u32,
    pub adults: u32,
    pub required_car_parking_spaces: u32,
    pub total_of_special_requests: u32,
    pub company: f64,
    pub agent: f64,
    pub hotel: Hotel,
    pub customer_type: CustomerType,
    pub market_segment: MarketSegment,
    pub distribution_channel: DistributionChannel,
    pub deposit_type: DepositType,
    pub meal: Meal,
    pub reserved_room_type: RoomType,
    pub assigned_room_type: RoomType,
    pub is_repeated_guest: u8,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FeatureValue {
    Number(f64),
    Category(String),
}

impl FeatureValue {
    pub fn kind(&self) -> &'static str {
        match self {
            FeatureValue::Number(_) => "number",
            FeatureValue::Category(_) => "category",
        }
    }
}

/// Named feature values handed to a classifier.
pub type FeatureRow = BTreeMap<String, FeatureValue>;

impl BookingRecord {
    pub fn to_features(&self) -> FeatureRow {
        let numbers = [
            ("lead_time", self.lead_time as f64),
            ("adr", self.adr),
            ("previous_cancellations", self.previous_cancellations as f64),
            (
                "previous_bookings_not_canceled",
                self.previous_bookings_not_canceled as f64,
            ),
            ("booking_changes", self.booking_changes as f64),
            ("days_in_waiting_list", self.days_in_waiting_list as f64),
            ("adults", self.adults as f64),
            (
                "required_car_parking_spaces",
                self.required_car_parking_spaces as f64,
            ),
            ("total_of_special_requests", self.total_of_special_requests as f64),
            ("company", self.company),
            ("agent", self.agent),
        ];
        let categories = [
            ("hotel", self.hotel.as_str().to_string()),
            ("customer_type", self.customer_type.as_str().to_string()),
            ("market_segment", self.market_segment.as_str().to_string()),
            (
                "distribution_channel",
                self.distribution_channel.as_str().to_string(),
            ),
            ("deposit_type", self.deposit_type.as_str().to_string()),
            ("meal", self.meal.as_str().to_string()),
            ("reserved_room_type", self.reserved_room_type.as_str().to_string()),
            ("assigned_room_type", self.assigned_room_type.as_str().to_string()),
            ("is_repeated_guest", self.is_repeated_guest.to_string()),
        ];

        let mut row = FeatureRow::new();
        for (name, value) in numbers {
            row.insert(name.to_string(), FeatureValue::Number(value));
        }
        for (name, value) in categories {
            row.insert(name.to_string(), FeatureValue::Category(value));
        }
        row
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GuestIdentity {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub gender: String,
}

/// A scored booking as shown on the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionEntry {
    pub sequence: u64,
    pub booking_id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub hotel: Hotel,
    pub lead_time: u32,
    pub adr: f64,
    pub deposit_type: DepositType,
    pub market_segment: MarketSegment,
    pub customer_type: CustomerType,
    pub adults: u32,
    pub guest: Option<GuestIdentity>,
    pub cancellation_probability: f64,
}

impl PredictionEntry {
    pub fn new(
        sequence: u64,
        record: &BookingRecord,
        guest: Option<GuestIdentity>,
        probability: f64,
        timestamp: DateTime<Utc>,
    ) -> Self {
        PredictionEntry {
            sequence,
            booking_id: Uuid::new_v4(),
            timestamp,
            hotel: record.hotel,
            lead_time: record.lead_time,
            adr: record.adr,
            deposit_type: record.deposit_type,
            market_segment: record.market_segment,
            customer_type: record.customer_type,
            adults: record.adults,
            guest,
            cancellation_probability: round_probability(probability),
        }
    }
}

#[derive(Debug, Clone)]
pub struct GroupSummary {
    pub label: String,
    pub count: usize,
    pub avg_probability: f64,
}

pub fn round_probability(probability: f64) -> f64 {
    (probability * 10_000.0).round() / 10_000.0
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskBand {
    Low,
    Medium,
    High,
}

impl RiskBand {
    pub fn from_probability(probability: f64) -> Self {
        match probability {
            p if p >= 0.7 => RiskBand::High,
            p if p >= 0.4 => RiskBand::Medium,
            _ => RiskBand::Low,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskBand::Low => "low",
            RiskBand::Medium => "medium",
            RiskBand::High => "high",
        }
    }
}

#[cfg(test)]
pub(crate) fn minimum_record() -> BookingRecord {
    BookingRecord {
        lead_time: 0,
        adr: 50.0,
        previous_cancellations: 0,
        previous_bookings_not_canceled: 0,
        booking_changes: 0,
        days_in_waiting_list: 0,
        adults: 1,
        required_car_parking_spaces: 0,
        total_of_special_requests: 0,
        company: 0.0,
        agent: 0.0,
        hotel: Hotel::Resort,
        customer_type: CustomerType::Contract,
        market_segment: MarketSegment::Direct,
        distribution_channel: DistributionChannel::Direct,
        deposit_type: DepositType::NoDeposit,
        meal: Meal::BedAndBreakfast,
        reserved_room_type: RoomType::A,
        assigned_room_type: RoomType::A,
        is_repeated_guest: 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn feature_row_covers_every_field() {
        let row = minimum_record().to_features();
        assert_eq!(row.len(), 20);
        assert_eq!(
            row.get("hotel"),
            Some(&FeatureValue::Category("Resort Hotel".to_string()))
        );
        assert_eq!(
            row.get("is_repeated_guest"),
            Some(&FeatureValue::Category("0".to_string()))
        );
        assert_eq!(row.get("adr"), Some(&FeatureValue::Number(50.0)));
    }

    #[test]
    fn probability_is_rounded_to_four_places() {
        assert_eq!(round_probability(0.123456), 0.1235);
        assert_eq!(round_probability(0.99996), 1.0);
        assert_eq!(round_probability(0.0), 0.0);
    }

    #[test]
    fn entry_copies_fields_of_interest() {
        let mut record = minimum_record();
        record.hotel = Hotel::City;
        record.lead_time = 42;
        let entry = PredictionEntry::new(7, &record, None, 0.45678, Utc::now());
        assert_eq!(entry.sequence, 7);
        assert_eq!(entry.hotel, Hotel::City);
        assert_eq!(entry.lead_time, 42);
        assert_eq!(entry.cancellation_probability, 0.4568);
    }

    #[test]
    fn risk_bands_split_at_thresholds() {
        assert_eq!(RiskBand::from_probability(0.1), RiskBand::Low);
        assert_eq!(RiskBand::from_probability(0.4), RiskBand::Medium);
        assert_eq!(RiskBand::from_probability(0.7321), RiskBand::High);
    }

    #[test]
    fn labels_match_training_categories() {
        assert_eq!(MarketSegment::OfflineTaTo.as_str(), "Offline TA/TO");
        assert_eq!(CustomerType::TransientParty.to_string(), "Transient-Party");
        assert_eq!(RoomType::ALL.len(), 12);
    }
}
