//! Networks shared by the tests of several modules

use crate::distribution::{CategoricalTable, ConditionalTable, DeterministicDistribution, UtilityTable};
use crate::model::{Network, NetworkBuilder, Node, UtilityFunction};
use crate::value::Value;
use crate::variable::Assignment;

use itertools::iproduct;


fn table(var: &str, rows: &[(Value, f64)]) -> CategoricalTable {
    CategoricalTable::new(var, rows.to_vec()).expect("malformed fixture table")
}

fn chance<D: Into<crate::distribution::Distribution>>(id: &str, distrib: D) -> Node {
    Node::chance(id, distrib).expect("malformed fixture node")
}

/// `P(var = true | parent = true) = if_true`, `P(var = true | parent = false) = if_false`
fn boolean_cpt(var: &str, parent: &str, if_true: f64, if_false: f64) -> ConditionalTable {
    ConditionalTable::builder(var)
        .add_row(Assignment::from_pair(parent, true), true, if_true)
        .add_row(Assignment::from_pair(parent, true), false, 1.0 - if_true)
        .add_row(Assignment::from_pair(parent, false), true, if_false)
        .add_row(Assignment::from_pair(parent, false), false, 1.0 - if_false)
        .build()
        .expect("malformed fixture table")
}


/// The modified Koller & Friedman student network over 0/1 variables, with the evidence
/// `D=0, L=1, S=0`. Under that evidence `P(I=1) = 0.02919708`.
pub fn student() -> (Network, Assignment) {
    let zero = Value::from(0);
    let one = Value::from(1);

    let d = table("D", &[(zero.clone(), 0.6), (one.clone(), 0.4)]);
    let i = table("I", &[(zero.clone(), 0.7), (one.clone(), 0.3)]);

    let g_rows = [((0, 0), 0.3), ((0, 1), 0.05), ((1, 0), 0.9), ((1, 1), 0.5)];
    let g = g_rows.iter()
                  .fold(ConditionalTable::builder("G"), |b, &((iv, dv), p0)| {
                      let cond = Assignment::from_pair("I", iv).with("D", dv);
                      b.add_row(cond.clone(), 0, p0).add_row(cond, 1, 1.0 - p0)
                  })
                  .build()
                  .expect("malformed fixture table");

    let s = ConditionalTable::builder("S")
                .add_row(Assignment::from_pair("I", 0), 0, 0.95)
                .add_row(Assignment::from_pair("I", 0), 1, 0.05)
                .add_row(Assignment::from_pair("I", 1), 0, 0.2)
                .add_row(Assignment::from_pair("I", 1), 1, 0.8)
                .build()
                .expect("malformed fixture table");

    let l = ConditionalTable::builder("L")
                .add_row(Assignment::from_pair("G", 0), 0, 0.9)
                .add_row(Assignment::from_pair("G", 0), 1, 0.1)
                .add_row(Assignment::from_pair("G", 1), 0, 0.4)
                .add_row(Assignment::from_pair("G", 1), 1, 0.6)
                .build()
                .expect("malformed fixture table");

    let network = NetworkBuilder::new()
                      .with_node(chance("D", d), &[])
                      .with_node(chance("I", i), &[])
                      .with_node(chance("G", g), &["I", "D"])
                      .with_node(chance("S", s), &["I"])
                      .with_node(chance("L", l), &["G"])
                      .build()
                      .expect("malformed fixture network");

    let evidence = Assignment::from_pair("D", 0).with("L", 1).with("S", 0);
    (network, evidence)
}


fn burglary_with(p_burglary: f64, p_earthquake: f64) -> Network {
    let b = table("Burglary", &[(Value::from(true), p_burglary), (Value::from(false), 1.0 - p_burglary)]);
    let e = table("Earthquake", &[(Value::from(true), p_earthquake), (Value::from(false), 1.0 - p_earthquake)]);

    let alarm_rows = [((true, true), 0.95), ((true, false), 0.95), ((false, true), 0.29), ((false, false), 0.001)];
    let alarm = alarm_rows.iter()
                          .fold(ConditionalTable::builder("Alarm"), |b, &((bv, ev), p)| {
                              let cond = Assignment::from_pair("Burglary", bv).with("Earthquake", ev);
                              b.add_row(cond.clone(), true, p).add_row(cond, false, 1.0 - p)
                          })
                          .build()
                          .expect("malformed fixture table");

    let mut util1 = UtilityTable::new();
    let mut util2 = UtilityTable::new();
    for &(burglary, action, u1, u2) in &[(true, "CallPolice", -0.5, 0.0),
                                         (false, "CallPolice", -1.0, 0.0),
                                         (true, "DoNothing", 0.0, -10.0),
                                         (false, "DoNothing", 0.0, 0.5)] {
        let a = Assignment::from_pair("Burglary", burglary).with("Action", action);
        util1.set_util(a.clone(), u1);
        util2.set_util(a, u2);
    }

    let action = Node::action("Action", vec![Value::from("CallPolice"), Value::from("DoNothing")])
                     .expect("malformed fixture node");

    NetworkBuilder::new()
        .with_node(chance("Burglary", b), &[])
        .with_node(chance("Earthquake", e), &[])
        .with_node(chance("Alarm", alarm), &["Burglary", "Earthquake"])
        .with_node(chance("MaryCalls", boolean_cpt("MaryCalls", "Alarm", 0.7, 0.01)), &["Alarm"])
        .with_node(chance("JohnCalls", boolean_cpt("JohnCalls", "Alarm", 0.9, 0.05)), &["Alarm"])
        .with_node(action, &[])
        .with_node(Node::utility("Util1", UtilityFunction::Table(util1)), &["Burglary", "Action"])
        .with_node(Node::utility("Util2", UtilityFunction::Table(util2)), &["Burglary", "Action"])
        .build()
        .expect("malformed fixture network")
}

/// The burglary alarm network with its two utility nodes over a police call decision
pub fn burglary() -> Network {
    burglary_with(0.001, 0.002)
}

/// The burglary alarm network with more frequent burglaries and earthquakes
pub fn burglary2() -> Network {
    burglary_with(0.1, 0.2)
}


/// The state of a dialogue about a robot: its identity, name, the floor it is on, and
/// whether it exists (with probability 0.9).
pub fn robot() -> Network {
    let exists = DeterministicDistribution::new("Exists(robot1)", false)
                     .with_mapping(Assignment::from_pair("robot1", true), true);
    let floor = CategoricalTable::uniform("floor", vec![Value::from(1), Value::from(2), Value::from(3)])
                    .expect("malformed fixture table");

    NetworkBuilder::new()
        .with_node(chance("name(robot1)", CategoricalTable::degenerate("name(robot1)", "r1")), &[])
        .with_node(chance("floor", floor), &[])
        .with_node(chance("robot1", table("robot1", &[(Value::from(true), 0.9), (Value::from(false), 0.1)])), &[])
        .with_node(chance("Exists(robot1)", exists), &["robot1"])
        .build()
        .expect("malformed fixture network")
}

/// The robot state extended with a second entity `bla` and its partial feature `feat(bla)`,
/// which is unspecified (`None`) with probability 0.2 when `bla = blaval1`.
/// `P(feat(bla) = 36) = 0.64`.
pub fn robot_with_feature() -> Network {
    let bla = table("bla", &[(Value::from("blaval1"), 0.8), (Value::from("blaval2"), 0.2)]);
    let feat = ConditionalTable::builder("feat(bla)")
                   .add_row(Assignment::from_pair("bla", "blaval1"), 36, 0.8)
                   .add_row(Assignment::from_pair("bla", "blaval2"), 24, 1.0)
                   .build()
                   .expect("malformed fixture table");

    let mut network = robot();
    network.add_node(chance("bla", bla)).expect("malformed fixture network");
    network.add_node(chance("feat(bla)", feat)).expect("malformed fixture network");
    network.connect("bla", "feat(bla)").expect("malformed fixture network");
    network
}


/// A chain of `size` four-valued variables `x0 .. x{size-1}`, each depending on the two
/// previous ones
pub fn chain(size: usize) -> Network {
    let values: Vec<Value> = (0..4).map(Value::from).collect();
    let base = [0.1, 0.2, 0.3, 0.4];

    let mut builder = NetworkBuilder::new();
    for k in 0..size {
        let id = format!("x{}", k);
        let parents: Vec<String> = (k.saturating_sub(2)..k).map(|p| format!("x{}", p)).collect();

        let node = if parents.is_empty() {
            let rows: Vec<(Value, f64)> = values.iter().cloned().zip(base.iter().cloned()).collect();
            chance(&id, table(&id, &rows))
        } else {
            let conditions: Vec<Assignment> = if parents.len() == 1 {
                values.iter().map(|v| Assignment::from_pair(parents[0].as_str(), v.clone())).collect()
            } else {
                iproduct!(values.iter(), values.iter())
                    .map(|(a, b)| Assignment::from_pair(parents[0].as_str(), a.clone())
                                      .with(parents[1].as_str(), b.clone()))
                    .collect()
            };

            let cpt = conditions.into_iter()
                                .enumerate()
                                .fold(ConditionalTable::builder(id.as_str()), |b, (shift, cond)| {
                                    (0..4).fold(b, |b, j| {
                                        b.add_row(cond.clone(), values[j].clone(), base[(j + shift) % 4])
                                    })
                                })
                                .build()
                                .expect("malformed fixture table");
            chance(&id, cpt)
        };

        let inputs: Vec<&str> = parents.iter().map(String::as_str).collect();
        builder = builder.with_node(node, &inputs);
    }

    builder.build().expect("malformed fixture network")
}
