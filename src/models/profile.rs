use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

/// Free-form health context attached to an account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: Uuid,
    pub user_id: Uuid,
    #[serde(flatten)]
    pub data: ProfileData,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Every profile field is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileData {
    // Basics
    pub birthdate: Option<NaiveDate>,
    pub biological_sex: Option<String>,
    pub height: Option<f64>,
    pub weight: Option<f64>,
    pub ethnicity: Option<String>,
    pub blood_type: Option<String>,

    // Lifestyle
    pub alcohol_consumption: Option<String>,
    pub tobacco_consumption: Option<String>,
    pub diet_type: Option<String>,
    pub medications: Option<String>,
    pub supplements: Option<String>,
    pub physical_activity_level: Option<String>,

    // Physiological context at sampling time
    pub is_menopause: Option<bool>,
    pub is_pregnant: Option<bool>,
    pub menstrual_cycle_phase: Option<String>,
    pub blood_test_time: Option<String>,
    pub blood_test_fasting: Option<bool>,

    // Medical context
    pub chronic_diseases: Option<String>,
    pub family_history: Option<String>,
    pub recent_infection: Option<String>,
}

/// Wraps whatever the body holds for a present key, `null` included, so it
/// can be told apart from a missing key.
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

macro_rules! profile_update {
    ($($field:ident: $ty:ty),+ $(,)?) => {
        /// Request body for profile create/update.
        ///
        /// Outer `None`: key absent, keep the stored value.
        /// `Some(None)`: explicit `null`, clear it.
        #[derive(Debug, Clone, Default, PartialEq, Deserialize)]
        #[serde(default)]
        pub struct ProfileUpdate {
            $(
                #[serde(deserialize_with = "present")]
                pub $field: Option<Option<$ty>>,
            )+
        }

        impl ProfileUpdate {
            pub fn apply_to(self, target: &mut ProfileData) {
                $(
                    if let Some(value) = self.$field {
                        target.$field = value;
                    }
                )+
            }
        }
    };
}

profile_update!(
    birthdate: NaiveDate,
    biological_sex: String,
    height: f64,
    weight: f64,
    ethnicity: String,
    blood_type: String,
    alcohol_consumption: String,
    tobacco_consumption: String,
    diet_type: String,
    medications: String,
    supplements: String,
    physical_activity_level: String,
    is_menopause: bool,
    is_pregnant: bool,
    menstrual_cycle_phase: String,
    blood_test_time: String,
    blood_test_fasting: bool,
    chronic_diseases: String,
    family_history: String,
    recent_infection: String,
);
