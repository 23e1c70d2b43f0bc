use namewire::{value, InjectFn, Injector};

// note: for the sake of simplicity, errors are unwrapped, rather than gracefully handled
fn main() {
    // an injector is a named container of dependencies
    let injector = Injector::new("app");

    // names are normalized, so "Greeting" and "greeting" address the same entry
    injector.register("Greeting").value("Hello");
    injector.register("subject").value("world");

    // functions declare the names they need; the injector resolves them in order
    let greet = InjectFn::new(["greeting", "subject"], |args| {
        let greeting = args.get_as::<&str>(0).expect("greeting should be a &str");
        let subject = args.get_as::<&str>(1).expect("subject should be a &str");
        value(format!("{greeting}, {subject}!"))
    });

    let result = injector
        .invoke(&greet, None)
        .expect("all dependencies are registered");

    println!(
        "{}",
        result.downcast::<String>().expect("greet returns a String")
    );
}
