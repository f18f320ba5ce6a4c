use rand::Rng;

/// Booking reference: `SW`, the four digit flight number and six random digits.
pub fn generate_booking_reference(flight_id: i64) -> String {
    let suffix: u32 = rand::thread_rng().gen_range(0..1_000_000);
    format!("SW{:04}{:06}", flight_id, suffix)
}

pub fn is_booking_reference(value: &str) -> bool {
    let value = value.trim();
    value.len() >= 12
        && value.starts_with("SW")
        && value[2..].chars().all(|c| c.is_ascii_digit())
}
