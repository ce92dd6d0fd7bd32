use std::sync::Arc;
use std::thread;

use criteria_engine::{
    ActionRow, CriterionRow, Engine, EngineStatus, Gender, InMemorySource, PatientData,
};

fn main() {
    let source = Arc::new(InMemorySource::new(
        vec![CriterionRow::new(1, "Adults", "Over17", "Patient.AgeGreaterThan=17")],
        vec![ActionRow::new(1, 1, "Notify", "SendEmail", "Send Email to", "ward@clinic.org")],
    ));
    let engine = Arc::new(
        Engine::builder(source.clone())
            .build()
            .expect("failed to load rules"),
    );

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let engine = Arc::clone(&engine);
            thread::spawn(move || {
                let born = format!("{}-01-01", 2000 + 2 * i);
                let patient = PatientData::parse(Gender::Male, &born).expect("valid date");
                let report = engine.run(&patient);
                println!("Thread {i} (born {born}): applicable {:?}", report.applicable());
            })
        })
        .collect();

    // Edit storage and reload while passes are in flight; the swap waits for Idle.
    source.replace(
        vec![CriterionRow::new(1, "Adults", "Over20", "Patient.AgeGreaterThan=20")],
        vec![ActionRow::new(1, 1, "Notify", "SendEmail", "Send Email to", "ward@clinic.org")],
    );
    match engine.reload() {
        Ok(report) => println!("Reloaded: {report}"),
        Err(err) => eprintln!("Reload failed: {err}"),
    }

    for h in handles {
        h.join().unwrap();
    }

    assert_eq!(engine.status(), EngineStatus::Idle);
    engine.with_graph(|graph| println!("{graph}"));
}
