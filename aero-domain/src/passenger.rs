use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    Dni,
    Passport,
    IdCard,
}

impl DocumentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentType::Dni => "dni",
            DocumentType::Passport => "passport",
            DocumentType::IdCard => "id_card",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "dni" => Some(DocumentType::Dni),
            "passport" => Some(DocumentType::Passport),
            "id_card" => Some(DocumentType::IdCard),
            _ => None,
        }
    }
}

impl std::fmt::Display for DocumentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Passenger {
    pub id: i64,
    pub given_name: String,
    pub family_name: String,
    pub document_type: DocumentType,
    pub document_number: String,
    pub email: String,
    pub phone: String,
    pub date_of_birth: NaiveDate,
    pub registered_at: DateTime<Utc>,
}

impl Passenger {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.given_name, self.family_name)
    }

    pub fn age(&self, today: NaiveDate) -> i32 {
        let mut years = today.year() - self.date_of_birth.year();
        let birthday = (self.date_of_birth.month(), self.date_of_birth.day());
        if (today.month(), today.day()) < birthday {
            years -= 1;
        }
        years
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPassenger {
    pub given_name: String,
    pub family_name: String,
    pub document_type: DocumentType,
    pub document_number: String,
    pub email: String,
    pub phone: String,
    pub date_of_birth: NaiveDate,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn passenger(dob: NaiveDate) -> Passenger {
        Passenger {
            id: 1,
            given_name: "Ana".to_string(),
            family_name: "Suarez".to_string(),
            document_type: DocumentType::Dni,
            document_number: "30111222".to_string(),
            email: "ana@example.com".to_string(),
            phone: "+54 11 5555 0001".to_string(),
            date_of_birth: dob,
            registered_at: Utc::now(),
        }
    }

    #[test]
    fn age_counts_completed_years_only() {
        let p = passenger(NaiveDate::from_ymd_opt(1990, 6, 15).unwrap());
        let before_birthday = NaiveDate::from_ymd_opt(2024, 6, 14).unwrap();
        let on_birthday = NaiveDate::from_ymd_opt(2024, 6, 15).unwrap();
        assert_eq!(p.age(before_birthday), 33);
        assert_eq!(p.age(on_birthday), 34);
    }

    #[test]
    fn full_name_joins_given_and_family() {
        let p = passenger(NaiveDate::from_ymd_opt(1990, 1, 1).unwrap());
        assert_eq!(p.full_name(), "Ana Suarez");
    }
}
