pub mod port_wiring;
