/*
 * Getting text out of switches.
 * Nothing here interprets spanning tree or CDP output beyond handing it to the parsers.
 * `core` holds the prober seam the collector is written against, `ssh` the CLI transport,
 * and `probe` glues the two together with the parsers.
 */

pub mod core;
pub mod probe;
pub mod ssh;
