use std::sync::Arc;

use criteria_engine::{ActionRow, CriterionRow, Engine, Gender, InMemorySource, PatientData};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Rows as the storage joins would return them
    let source = InMemorySource::new(
        vec![
            CriterionRow::new(1, "Women", "IsFemale", "Patient.IsFemale"),
            CriterionRow::new(3, "Women over 22", "IsFemale", "Patient.IsFemale"),
            CriterionRow::new(3, "Women over 22", "Over22", "Patient.AgeGreaterThan=22"),
        ],
        vec![
            ActionRow::new(1, 1, "Notify", "SendEmail", "Send Email to", "ward@clinic.org"),
            ActionRow::new(3, 1, "Notify", "SendEmail", "Send Email to", "gp@clinic.org"),
            ActionRow::new(3, 1, "Notify", "SendEmail", "Copy Email to", "audit@clinic.org"),
        ],
    );

    let engine = Engine::builder(Arc::new(source))
        .build()
        .expect("failed to load rules");

    engine.with_graph(|graph| println!("{graph}"));

    let patient = PatientData::parse(Gender::Female, "1994-03-23").expect("valid date");
    let report = engine.run(&patient);
    println!("{report}");
    println!("applicable rules: {:?}", report.applicable());
}
