//! End-to-end dispatch behavior through the public registry surface.

use std::{sync::Arc, thread};

use kobj::{Args, Binding, Error, Object, Registry, Value};

fn shape_default_describe(_obj: &Object, _args: Args<'_>) -> Result<Value, Error> {
	Ok(Box::new(String::from("shape")))
}

fn circle_area(obj: &Object, _args: Args<'_>) -> Result<Value, Error> {
	let radius = obj.data::<f64>().copied().unwrap_or(0.0);
	Ok(Box::new(radius * radius * core::f64::consts::PI))
}

#[test]
fn shape_scenario() {
	let reg = Registry::new();

	let shape = reg.declare_interface("shape").unwrap();
	let area = shape.declare_method("area", None).unwrap();
	let describe = shape
		.declare_method("describe", Some(shape_default_describe))
		.unwrap();

	let circle = reg.declare_class("circle", &[]).unwrap();
	circle.override_method(&area, circle_area).unwrap();
	reg.declare_class("blob", &[]).unwrap();

	let handle = reg.bind_with("circle", Box::new(2.0_f64)).unwrap();

	let described = handle.call(&describe, &[]).unwrap();
	assert_eq!(
		described.downcast::<String>().map(|s| *s).unwrap(),
		"shape"
	);

	let computed = handle.call(&area, &[]).unwrap();
	let computed = computed.downcast::<f64>().map(|v| *v).unwrap();
	assert!((computed - 4.0 * core::f64::consts::PI).abs() < 1e-9);

	let blob = reg.bind("blob").unwrap();
	assert_eq!(
		blob.call(&area, &[]).unwrap_err(),
		Error::MissingMethod {
			method: area.id(),
			class:  String::from("blob"),
		}
	);
	// The default still applies to the override-less class.
	let described = blob.call(&describe, &[]).unwrap();
	assert_eq!(
		described.downcast::<String>().map(|s| *s).unwrap(),
		"shape"
	);
}

#[test]
fn describe_reports_binding_provenance() {
	fn nop(_obj: &Object, _args: Args<'_>) -> Result<Value, Error> {
		Ok(Box::new(()))
	}

	let reg = Registry::new();

	let dev = reg.declare_interface("device").unwrap();
	dev.declare_method("probe", Some(nop)).unwrap();
	let attach = dev.declare_method("attach", None).unwrap();
	let detach = dev.declare_method("detach", None).unwrap();
	let suspend = dev.declare_method("suspend", None).unwrap();

	let base = reg.declare_class("base", &[]).unwrap();
	base.override_method(&attach, nop).unwrap();
	let child = reg.declare_class("child", &[base]).unwrap();
	child.override_method(&detach, nop).unwrap();

	let bindings = reg.describe("child").unwrap();
	let binding = |name: &str| {
		bindings
			.iter()
			.find(|(n, _)| n == name)
			.map(|(_, b)| b.clone())
			.unwrap()
	};

	assert_eq!(binding("probe"), Binding::Default);
	assert_eq!(
		binding("attach"),
		Binding::Inherited {
			from: String::from("base")
		}
	);
	assert_eq!(binding("detach"), Binding::Own);
	assert_eq!(binding("suspend"), Binding::Trap);

	// `would_trap` agrees with the description.
	let child = reg.class("child").unwrap();
	assert!(child.would_trap(&suspend));
	assert!(!child.would_trap(&attach));

	assert_eq!(
		reg.describe("ghost").unwrap_err(),
		Error::UnknownClass(String::from("ghost"))
	);
}

#[test]
fn resolution_is_stable_after_freeze() {
	fn nop(_obj: &Object, _args: Args<'_>) -> Result<Value, Error> {
		Ok(Box::new(()))
	}

	let reg = Registry::new();
	let iface = reg.declare_interface("i").unwrap();
	let m = iface.declare_method("m", None).unwrap();

	let class = reg.declare_class("c", &[]).unwrap();
	class.override_method(&m, nop).unwrap();

	let first = class.resolve(&m);
	for _ in 0..8 {
		let again = class.resolve(&m);
		assert_eq!(again.func() as usize, first.func() as usize);
		assert_eq!(again.origin(), first.origin());
	}
}

#[test]
fn concurrent_first_dispatch_compiles_one_table() {
	fn nop(_obj: &Object, _args: Args<'_>) -> Result<Value, Error> {
		Ok(Box::new(()))
	}

	let reg = Arc::new(Registry::new());
	let iface = reg.declare_interface("i").unwrap();
	let m = iface.declare_method("m", None).unwrap();

	let class = reg.declare_class("c", &[]).unwrap();
	class.override_method(&m, nop).unwrap();

	let handles: Vec<_> = (0..8)
		.map(|_| {
			let reg = reg.clone();
			let m = m.clone();
			thread::spawn(move || {
				let obj = reg.bind("c").unwrap();
				obj.call(&m, &[]).unwrap();
			})
		})
		.collect();

	for handle in handles {
		handle.join().unwrap();
	}

	// Every dispatch shared the single compiled table.
	let t1 = class.compile();
	let t2 = class.compile();
	assert!(Arc::ptr_eq(&t1, &t2));
	assert!(class.frozen());
}

#[test]
fn upward_delegation_is_an_ordinary_override() {
	// A class-supplied implementation that forwards to a *parent
	// object* held in instance state, not to the inheritance graph.
	// The compiler treats it like any other override.
	fn forward_to_owner(obj: &Object, _args: Args<'_>) -> Result<Value, Error> {
		let owner = obj.data::<String>().cloned().unwrap_or_default();
		Ok(Box::new(owner))
	}

	let reg = Registry::new();
	let iface = reg.declare_interface("mem").unwrap();
	let alloc = iface.declare_method("alloc", None).unwrap();

	let bridge = reg.declare_class("bridge", &[]).unwrap();
	bridge.override_method(&alloc, forward_to_owner).unwrap();

	assert_eq!(reg.class("bridge").unwrap().binding(&alloc), Binding::Own);

	let obj = reg
		.bind_with("bridge", Box::new(String::from("parent-bus")))
		.unwrap();
	let got = obj.call(&alloc, &[]).unwrap();
	assert_eq!(got.downcast::<String>().map(|s| *s).unwrap(), "parent-bus");
}
