use std::sync::Arc;

use criteria_engine::{
    ActionRow, CriterionRow, Engine, Gender, InMemorySource, ObservationData, PatientData,
};

fn main() {
    let mut absent = CriterionRow::new(5, "Orphan", "Missing", "");
    absent.logic_spec = None;

    let source = InMemorySource::new(
        vec![
            CriterionRow::new(1, "Women", "IsFemale", "Patient.IsFemale"),
            CriterionRow::new(2, "Hypoglycaemia", "LowSugar", "Observation.BloodGlucoseLessThan=70"),
            CriterionRow::new(3, "Heavy women", "IsFemale", "Patient.IsFemale"),
            CriterionRow::new(3, "Heavy women", "Heavy", "Observation.BodyWeightGreaterThan=90"),
            CriterionRow::new(4, "Typo", "Older", "Patient:AgeGreaterThan=22"),
            absent,
        ],
        vec![
            ActionRow::new(1, 1, "Notify", "SendEmail", "Send Email to", "ward@clinic.org"),
            ActionRow::new(2, 1, "Page", "SendEmail", "Send Email to", "oncall@clinic.org"),
            ActionRow::new(3, 1, "Notify", "SendEmail", "Send Email to", "dietitian@clinic.org"),
            ActionRow::new(4, 1, "Notify", "SendEmail", "Send Email to", "ward@clinic.org"),
            ActionRow::new(5, 1, "Fax", "SendFax", "Number", "555-0100"),
        ],
    );

    let engine = Engine::builder(Arc::new(source))
        .build()
        .expect("failed to load rules");

    let load = engine.last_load();
    println!("Load: {load}");
    println!("  Removed rules:    {:?}", load.removed_rules());
    println!("  Pruned criteria:  {:?}", load.pruned_criteria());

    engine.with_graph(|graph| {
        for rule in graph.rules() {
            let criteria: Vec<String> = graph.criteria_of(rule).map(ToString::to_string).collect();
            println!("  {rule}: {}", criteria.join(" AND "));
        }
    });

    let patient = PatientData::parse(Gender::Female, "1994-03-23").expect("valid date");
    let observation = ObservationData::new(96.5, 62.0);

    for (label, report) in [
        ("Patient", engine.run(&patient)),
        ("Observation", engine.run(&observation)),
    ] {
        println!("{label} pass: {report}");
        println!("  Evaluated:    {:?}", report.evaluated());
        println!("  Incompatible: {:?}", report.incompatible());
        println!("  Applicable:   {:?}", report.applicable());
        println!("  Skipped:      {:?}", report.skipped());
        println!("  Duration:     {:?}", report.duration());
    }
}
