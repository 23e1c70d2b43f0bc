use namewire::{describe, value, InjectFn, Injector};

// note: for the sake of simplicity, errors are unwrapped, rather than gracefully handled
fn main() {
    // a platform injector exposes some entries to importers; private ones
    // stay local no matter who imports it
    let platform = Injector::new("platform");
    platform.register("logger").value("stdout").public();
    platform.register("apikey").value("s3cr3t");

    // children import their parent (and its imports) automatically
    let app = platform.new_child("app");
    app.register("greeting").value("hello");

    let report = InjectFn::new(["greeting", "logger"], |args| {
        let greeting = args.get_as::<&str>(0).expect("greeting should be a &str");
        let logger = args.get_as::<&str>(1).expect("logger should be a &str");
        value(format!("[{logger}] {greeting}"))
    });

    let line = app
        .invoke(&report, None)
        .expect("greeting is local, logger is imported");
    println!("{}", line.downcast::<String>().expect("report returns a String"));

    // the api key is private to the platform injector
    assert!(app.get("apikey").expect("lookup never fails here").is_none());

    print!("{}", describe(&app));
}
