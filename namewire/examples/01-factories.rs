use namewire::{value, InjectFn, Injector};

// note: for the sake of simplicity, errors are unwrapped, rather than gracefully handled
fn main() {
    let injector = Injector::new("app");
    injector.register("host").value("localhost");
    injector.register("port").value(8080_u16);

    // a factory is invoked through its injector the first time the name is
    // requested; afterwards the memoized result is served
    injector.register("url").factory(InjectFn::new(["host", "port"], |args| {
        let host = args.get_as::<&str>(0).expect("host should be a &str");
        let port = args.get_as::<u16>(1).expect("port should be a u16");
        println!("building url once");
        value(format!("http://{host}:{port}"))
    }));

    for _ in 0..3 {
        let url = injector
            .require_as::<String>("url")
            .expect("url factory is registered");
        println!("resolved {url}");
    }
}
