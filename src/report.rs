//! Text and CSV reporting (spec §4.J): renders a finished [`Solution`] as
//! a human-readable itinerary per vehicle, or as flat CSV records for
//! downstream tooling.

use colored::Colorize;

use crate::domain::catalog::NodeCatalog;
use crate::domain::solution::Solution;

pub fn print_text(solution: &Solution, catalog: &NodeCatalog) {
    for route in &solution.routes {
        if !route.has_containers() {
            continue;
        }
        println!("vehicle {}:", route.vehicle.vid);
        for i in 0..route.len() {
            let node_id = route.sequence[i];
            let state = route.state_at(i);
            let node = catalog.get(node_id).expect("route nodes are always in the catalog");
            println!(
                "  [{i:>3}] node {:<6} {:<9} arrive={:>8.1} depart={:>8.1} load={:>7.1}",
                node_id,
                format!("{:?}", node.kind),
                state.arrival_time,
                state.departure_time,
                state.load_after,
            );
        }
        let status = if route.feasible() {
            "feasible".green()
        } else {
            "infeasible".red()
        };
        println!(
            "  travel={:.1} trips={} cost={:.1} [{status}]",
            route.total_travel(),
            route.dump_count(),
            route.cost(),
        );
    }

    if !solution.unassigned.is_empty() {
        println!("{}", format!("unassigned containers: {:?}", solution.unassigned).red());
    }

    let summary = format!(
        "vehicles_used={} containers_served={} total_travel={:.1} total_cost={:.1}",
        solution.num_vehicles_used(),
        solution.num_containers_served(),
        solution.total_travel(),
        solution.total_cost(),
    );
    if solution.is_feasible() {
        println!("{}", summary.green());
    } else {
        println!("{}", summary.red());
    }
}

pub fn write_csv<W: std::io::Write>(writer: W, solution: &Solution) -> Result<(), csv::Error> {
    let mut w = csv::Writer::from_writer(writer);
    w.write_record(["vid", "seq_index", "node_id", "arrival", "departure", "load"])?;
    for route in &solution.routes {
        if !route.has_containers() {
            continue;
        }
        for i in 0..route.len() {
            let state = route.state_at(i);
            w.write_record(&[
                route.vehicle.vid.to_string(),
                i.to_string(),
                route.sequence[i].to_string(),
                format!("{:.3}", state.arrival_time),
                format!("{:.3}", state.departure_time),
                format!("{:.3}", state.load_after),
            ])?;
        }
    }
    w.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::distance::oracle::{CostOracle, MatrixOracle};
    use crate::domain::types::{Node, NodeKind, Vehicle};

    fn fixture() -> (Solution, NodeCatalog) {
        let nodes = vec![
            Node::new(0, 0.0, 0.0, 0.0, 1000.0, 0.0, 0.0, NodeKind::Depot),
            Node::new(1, 1.0, 0.0, 0.0, 1000.0, 0.0, 3.0, NodeKind::Container),
            Node::new(2, 0.0, 1.0, 0.0, 1000.0, 0.0, 0.0, NodeKind::Dump),
        ];
        let catalog = NodeCatalog::build(nodes).unwrap();
        let oracle: Arc<dyn CostOracle> = Arc::new(MatrixOracle::from_entries([
            (0, 1, 5.0),
            (1, 0, 5.0),
            (0, 2, 5.0),
            (2, 0, 5.0),
            (1, 2, 5.0),
            (2, 1, 5.0),
        ]));
        let vehicles = vec![Vehicle::new(1, 0, 2, 0, 10.0, 2, 0.0, 1000.0)];
        let mut solution = Solution::empty(vehicles, Arc::new(catalog.clone()), oracle);
        solution.routes[0].insert(1, 1);
        (solution, catalog)
    }

    #[test]
    fn csv_output_has_a_row_per_visited_position() {
        let (solution, _) = fixture();
        let mut buf = Vec::new();
        write_csv(&mut buf, &solution).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text.lines().count(), 1 + solution.routes[0].len());
    }

    #[test]
    fn text_output_does_not_panic_on_feasible_solution() {
        let (solution, catalog) = fixture();
        print_text(&solution, &catalog);
    }
}
